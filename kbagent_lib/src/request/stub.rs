//! Only for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Cursor};
use serde_json::Value;
use crate::error::Error;
use crate::request::client::Client;

/// Request kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// JSON POST.
    Post,
    /// JSON GET.
    Get,
    /// Streaming POST.
    Stream,
}

/// One expected request and the canned response to it.
pub struct Exchange {
    method: Method,
    expected_url: Option<String>,
    expected_headers: Vec<(String, String)>,
    expected_params: Vec<(String, String)>,
    expected_payload: Option<Value>,
    response_body: Value,
    stream_body: String,
}

impl Exchange {

    /// Expect a JSON POST and reply with `response_body`.
    pub fn post(response_body: Value) -> Self {
        Self::with_method(Method::Post, response_body, String::new())
    }

    /// Expect a GET and reply with `response_body`.
    pub fn get(response_body: Value) -> Self {
        Self::with_method(Method::Get, response_body, String::new())
    }

    /// Expect a streaming POST and reply with raw event-stream text.
    pub fn stream(stream_body: &str) -> Self {
        Self::with_method(Method::Stream, Value::Null, stream_body.to_owned())
    }

    fn with_method(method: Method, response_body: Value, stream_body: String) -> Self {
        Exchange {
            method,
            expected_url: None,
            expected_headers: vec![],
            expected_params: vec![],
            expected_payload: None,
            response_body,
            stream_body,
        }
    }

    /// Check the request URL.
    pub fn url(mut self, url: &str) -> Self {
        self.expected_url = Some(url.to_owned());
        self
    }

    /// Check the request headers.
    pub fn headers(mut self, headers: &[(&str, &str)]) -> Self {
        self.expected_headers = headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self
    }

    /// Check the query parameters.
    pub fn params(mut self, params: &[(&str, &str)]) -> Self {
        self.expected_params = params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self
    }

    /// Check the request body.
    pub fn payload(mut self, payload: Value) -> Self {
        self.expected_payload = Some(payload);
        self
    }
}

/// Client for tests.
pub struct StubClient {
    exchanges: RefCell<VecDeque<Exchange>>,
}

impl StubClient {

    /// Create client expecting a single JSON POST.
    pub fn new(expected_headers: Vec<(String, String)>,
        expected_params: Vec<(String, String)>,
        expected_payload: Value,
        response_body: Value) -> Self
    {
        let exchange = Exchange {
            method: Method::Post,
            expected_url: None,
            expected_headers,
            expected_params,
            expected_payload: Some(expected_payload),
            response_body,
            stream_body: String::new(),
        };
        Self::sequence(vec![exchange])
    }

    /// Create client replaying the exchanges in order.
    pub fn sequence(exchanges: Vec<Exchange>) -> Self {
        StubClient {
            exchanges: RefCell::new(exchanges.into()),
        }
    }

    /// Number of exchanges not requested yet.
    pub fn remaining(&self) -> usize {
        self.exchanges.borrow().len()
    }

    fn next(&self, method: Method, url: &str, payload: Option<&Value>, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Exchange {
        let exchange = self.exchanges.borrow_mut().pop_front().expect("unexpected request");

        assert_eq!(exchange.method, method, "request method for {url}");

        if let Some(expected) = &exchange.expected_url {
            assert_eq!(expected, url, "request url");
        }

        for (expected, actual) in headers.iter().zip(exchange.expected_headers.iter()) {
            assert_eq!(expected.0, actual.0, "headers keys");
            assert_eq!(expected.1, actual.1, "headers values");
        }

        for (expected, actual) in params.iter().zip(exchange.expected_params.iter()) {
            assert_eq!(expected.0, actual.0, "params keys");
            assert_eq!(expected.1, actual.1, "params values");
        }

        if let (Some(expected), Some(actual)) = (&exchange.expected_payload, payload) {
            assert_eq!(actual, expected);
        }

        exchange
    }
}

impl Client for StubClient {

    fn make_json_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error> {
        let exchange = self.next(Method::Post, url, Some(&payload), headers, params);
        Ok(exchange.response_body)
    }

    fn get_json(&self, url: &str, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error> {
        let exchange = self.next(Method::Get, url, None, headers, params);
        Ok(exchange.response_body)
    }

    fn make_stream_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Box<dyn BufRead>, Error> {
        let exchange = self.next(Method::Stream, url, Some(&payload), headers, params);
        Ok(Box::new(Cursor::new(exchange.stream_body.into_bytes())))
    }
}
