pub mod authorize;
pub mod grants;
pub mod health;
pub mod resources;
pub mod token;
