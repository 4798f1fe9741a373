pub mod callback;
pub mod magic_link;
