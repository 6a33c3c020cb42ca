pub mod books;
pub mod chapters;
pub mod toc;
