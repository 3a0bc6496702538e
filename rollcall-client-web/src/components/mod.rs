pub mod users;

pub use users::Users;
