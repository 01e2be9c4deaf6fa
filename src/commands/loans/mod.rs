pub mod issue_book_command;
pub mod return_book_command;

pub use issue_book_command::IssueBookCommand;
pub use return_book_command::ReturnBookCommand;
