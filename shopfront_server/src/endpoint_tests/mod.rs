mod helpers;
mod mocks;

mod cart;
mod orders;
mod payments;
