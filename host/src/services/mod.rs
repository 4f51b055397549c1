pub mod request_url;
