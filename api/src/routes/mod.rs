pub mod faq;
pub mod health_route;
