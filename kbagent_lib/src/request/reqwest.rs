use std::io::{BufRead, BufReader};
use std::time::Duration;
use reqwest::blocking::{Client as BlockingClient, RequestBuilder, Response};
use serde_json::Value;
use crate::error::Error;
use crate::request::client::Client;

// Model calls with long answers can take minutes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub struct ReqwestClient {
    client: BlockingClient,
}

impl ReqwestClient {

    pub fn new() -> Result<Self, Error> {
        let client = BlockingClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(ReqwestClient {
            client,
        })
    }

    fn send(mut request: RequestBuilder, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Response, Error> {
        request = request.query(params);

        for (k, v) in headers {
            request = request.header(*k, *v);
        }

        Ok(request.send()?)
    }

    /// Providers report failures in a JSON `error` field, keep those for the caller.
    fn into_json(response: Response) -> Result<Value, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json()?);
        }

        let text = response.text()?;
        match serde_json::from_str::<Value>(&text) {
            Ok(body) if body.get("error").is_some() => Ok(body),
            _ => Err(Error::HttpStatus(status.as_u16(), text)),
        }
    }
}

impl Client for ReqwestClient {

    fn make_json_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error> {
        tracing::debug!(url, "POST");

        let response = Self::send(self.client.post(url).json(&payload), headers, params)?;

        Self::into_json(response)
    }

    fn get_json(&self, url: &str, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Value, Error> {
        tracing::debug!(url, "GET");

        let response = Self::send(self.client.get(url), headers, params)?;

        Self::into_json(response)
    }

    fn make_stream_request(&self, url: &str, payload: Value, headers: &[(&str, &str)], params: &[(&str, &str)]) -> Result<Box<dyn BufRead>, Error> {
        tracing::debug!(url, "POST (stream)");

        let response = Self::send(self.client.post(url).json(&payload), headers, params)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text()?;
            if let Ok(body) = serde_json::from_str::<Value>(&text) {
                if let Some(message) = body["error"]["message"].as_str() {
                    return Err(Error::LLMErrorMessage(message.to_owned()));
                }
            }
            return Err(Error::HttpStatus(status.as_u16(), text));
        }

        Ok(Box::new(BufReader::new(response)))
    }
}
