pub mod book;
pub mod issued_book;
pub mod student;

pub use book::Entity as Book;
pub use issued_book::Entity as IssuedBook;
pub use student::{Department, Entity as Student};
