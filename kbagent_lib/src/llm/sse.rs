//! Server-sent events reader.

use std::io::BufRead;
use serde_json::Value;
use crate::error::Error;

/// One dispatched event.
pub struct Event {
    /// Value of the `event:` field, empty when absent.
    pub name: String,
    /// Joined `data:` lines.
    pub data: String,
}

impl Event {
    /// Parse event data as JSON.
    pub fn json(&self) -> Result<Value, Error> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

/// Read events until the stream ends or the handler returns `false`.
pub fn for_each_event<F>(reader: Box<dyn BufRead>, mut handler: F) -> Result<(), Error>
where F: FnMut(Event) -> Result<bool, Error>
{
    let mut name = String::new();
    let mut data: Vec<String> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            if !data.is_empty() {
                let event = Event { name: std::mem::take(&mut name), data: data.join("\n") };
                data.clear();
                if !handler(event)? {
                    return Ok(());
                }
            }
            name.clear();
            continue;
        }

        if line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => name = value.to_owned(),
            "data" => data.push(value.to_owned()),
            _ => {}
        }
    }

    // Stream closed without a trailing blank line.
    if !data.is_empty() {
        handler(Event { name, data: data.join("\n") })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(body: &str) -> Vec<(String, String)> {
        let mut events = Vec::new();
        for_each_event(Box::new(Cursor::new(body.to_owned().into_bytes())), |event| {
            events.push((event.name, event.data));
            Ok(true)
        }).expect("read events");
        events
    }

    #[test]
    fn test_events() {
        let body = ": keep-alive\n\nevent: message_start\ndata: {\"a\":1}\n\ndata: first\r\ndata: second\r\n\r\ndata:[DONE]";
        let events = collect(body);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ("message_start".to_owned(), "{\"a\":1}".to_owned()));
        assert_eq!(events[1], (String::new(), "first\nsecond".to_owned()));
        assert_eq!(events[2], (String::new(), "[DONE]".to_owned()));
    }

    #[test]
    fn test_handler_stops() {
        let body = "data: 1\n\ndata: 2\n\n";
        let mut seen = 0;
        for_each_event(Box::new(Cursor::new(body.as_bytes().to_vec())), |_| {
            seen += 1;
            Ok(false)
        }).expect("read events");
        assert_eq!(seen, 1);
    }
}
