pub mod use_sale;
