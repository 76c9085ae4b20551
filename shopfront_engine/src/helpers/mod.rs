mod user_lock;

pub use user_lock::UserLocks;
