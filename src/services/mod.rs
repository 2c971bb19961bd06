pub mod company;
pub mod reviews;
pub mod wishlist;
