use std::io::BufRead;
use std::rc::Rc;
use serde_json::Value;
use crate::error::Error;
use super::reqwest::ReqwestClient;

/// Request client.
pub trait Client {
    /// Send request and receive response.
    fn make_json_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error>;

    /// Fetch a JSON document.
    fn get_json(&self, url: &str, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error>;

    /// Send request and return the response body as a line reader (server-sent events).
    fn make_stream_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Box<dyn BufRead>, Error>;
}

/// Create reqwest client.
pub fn get_reqwest_client() -> Result<Rc<dyn Client>, Error> {
    Ok(Rc::new(ReqwestClient::new()?))
}
