pub mod company_footer;
pub mod rating_stars;
pub mod review_form;
pub mod review_showcase;
pub mod reviews_list;
