pub mod domains;
pub mod groups;
pub mod tenants;
pub mod users;
