pub mod faq_request;
pub mod faq_route;
