pub mod catalog;
pub mod company;
pub mod content;
pub mod customer;
pub mod review;
