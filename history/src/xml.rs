//! XML encoding of the history document.
//!
//! Layout:
//! `<History><Metadata><Date/><GameMode/><ServerIp/><Map><Row/>...</Map>
//! <Path><Point x="" y=""/>...</Path></Metadata><Events><Event><Time/>
//! <Type/><Data><Field name="" type=""/>...</Data></Event>...</Events>
//! </History>`. Field elements carry a `type` attribute so integers, floats,
//! and text survive the trip unchanged.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::{Reader, Writer};

use crate::document::{DataValue, GameHistory, HistoryEvent};
use crate::HistoryError;

/// Encodes a history document as indented XML.
pub fn save_xml(history: &GameHistory) -> Result<String, HistoryError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(XmlEvent::Start(BytesStart::new("History")))?;

    writer.write_event(XmlEvent::Start(BytesStart::new("Metadata")))?;
    write_text_element(&mut writer, "Date", &history.date)?;
    write_text_element(&mut writer, "GameMode", &history.game_mode)?;
    write_text_element(&mut writer, "ServerIp", &history.server_ip)?;

    writer.write_event(XmlEvent::Start(BytesStart::new("Map")))?;
    for row in &history.map {
        let encoded = row
            .iter()
            .map(|tile| tile.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write_text_element(&mut writer, "Row", &encoded)?;
    }
    writer.write_event(XmlEvent::End(BytesEnd::new("Map")))?;

    writer.write_event(XmlEvent::Start(BytesStart::new("Path")))?;
    for [x, y] in &history.path {
        let mut point = BytesStart::new("Point");
        point.push_attribute(("x", x.to_string().as_str()));
        point.push_attribute(("y", y.to_string().as_str()));
        writer.write_event(XmlEvent::Empty(point))?;
    }
    writer.write_event(XmlEvent::End(BytesEnd::new("Path")))?;
    writer.write_event(XmlEvent::End(BytesEnd::new("Metadata")))?;

    writer.write_event(XmlEvent::Start(BytesStart::new("Events")))?;
    for event in &history.events {
        writer.write_event(XmlEvent::Start(BytesStart::new("Event")))?;
        write_text_element(&mut writer, "Time", &event.time.to_string())?;
        write_text_element(&mut writer, "Type", &event.kind)?;
        writer.write_event(XmlEvent::Start(BytesStart::new("Data")))?;
        for (name, value) in &event.data {
            let (type_tag, text) = match value {
                DataValue::Int(int) => ("int", int.to_string()),
                DataValue::Float(float) => ("float", float.to_string()),
                DataValue::Text(string) => ("str", string.clone()),
            };
            let mut field = BytesStart::new("Field");
            field.push_attribute(("name", name.as_str()));
            field.push_attribute(("type", type_tag));
            if text.is_empty() {
                writer.write_event(XmlEvent::Empty(field))?;
            } else {
                writer.write_event(XmlEvent::Start(field))?;
                writer.write_event(XmlEvent::Text(BytesText::new(&text)))?;
                writer.write_event(XmlEvent::End(BytesEnd::new("Field")))?;
            }
        }
        writer.write_event(XmlEvent::End(BytesEnd::new("Data")))?;
        writer.write_event(XmlEvent::End(BytesEnd::new("Event")))?;
    }
    writer.write_event(XmlEvent::End(BytesEnd::new("Events")))?;
    writer.write_event(XmlEvent::End(BytesEnd::new("History")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|error| HistoryError::Malformed(error.to_string()))
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), HistoryError> {
    if text.is_empty() {
        writer.write_event(XmlEvent::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    writer.write_event(XmlEvent::Start(BytesStart::new(name)))?;
    writer.write_event(XmlEvent::Text(BytesText::new(text)))?;
    writer.write_event(XmlEvent::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Decodes a history document from XML.
pub fn load_xml(input: &str) -> Result<GameHistory, HistoryError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut history = GameHistory::default();
    let mut element_stack: Vec<String> = Vec::new();
    let mut event_time = 0.0_f64;
    let mut event_kind = String::new();
    let mut event_data: BTreeMap<String, DataValue> = BTreeMap::new();
    let mut field_name = String::new();
    let mut field_type = String::new();

    loop {
        match reader.read_event()? {
            XmlEvent::Start(start) => {
                let name = element_name(&start);
                match name.as_str() {
                    "Event" => {
                        event_time = 0.0;
                        event_kind.clear();
                        event_data = BTreeMap::new();
                    }
                    "Field" => {
                        let (attr_name, attr_type) = field_attributes(&start)?;
                        field_name = attr_name;
                        field_type = attr_type;
                    }
                    _ => {}
                }
                element_stack.push(name);
            }
            XmlEvent::Empty(start) => {
                let name = element_name(&start);
                match name.as_str() {
                    "Point" => history.path.push(point_attributes(&start)?),
                    "Field" => {
                        let (attr_name, attr_type) = field_attributes(&start)?;
                        let value = parse_field(&attr_type, "")?;
                        let _ = event_data.insert(attr_name, value);
                    }
                    "Row" => history.map.push(Vec::new()),
                    _ => {}
                }
            }
            XmlEvent::Text(text) => {
                let value = text.unescape()?.into_owned();
                match element_stack.last().map(String::as_str) {
                    Some("Date") => history.date = value,
                    Some("GameMode") => history.game_mode = value,
                    Some("ServerIp") => history.server_ip = value,
                    Some("Row") => history.map.push(parse_row(&value)?),
                    Some("Time") => {
                        event_time = value.parse().map_err(|_| {
                            HistoryError::Malformed(format!("invalid event time {value:?}"))
                        })?;
                    }
                    Some("Type") => event_kind = value,
                    Some("Field") => {
                        let parsed = parse_field(&field_type, &value)?;
                        let _ = event_data.insert(std::mem::take(&mut field_name), parsed);
                    }
                    _ => {}
                }
            }
            XmlEvent::End(end) => {
                if end.name().as_ref() == b"Event" {
                    history.events.push(HistoryEvent {
                        time: event_time,
                        kind: std::mem::take(&mut event_kind),
                        data: std::mem::take(&mut event_data),
                    });
                }
                let _ = element_stack.pop();
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    Ok(history)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn field_attributes(start: &BytesStart<'_>) -> Result<(String, String), HistoryError> {
    let mut name = None;
    let mut type_tag = None;
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| HistoryError::Malformed(error.to_string()))?;
        let value = attribute.unescape_value()?.into_owned();
        match attribute.key.as_ref() {
            b"name" => name = Some(value),
            b"type" => type_tag = Some(value),
            _ => {}
        }
    }
    match (name, type_tag) {
        (Some(name), Some(type_tag)) => Ok((name, type_tag)),
        _ => Err(HistoryError::Malformed(
            "field element missing name or type attribute".to_owned(),
        )),
    }
}

fn point_attributes(start: &BytesStart<'_>) -> Result<[u32; 2], HistoryError> {
    let mut x = None;
    let mut y = None;
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| HistoryError::Malformed(error.to_string()))?;
        let value = attribute.unescape_value()?;
        let parsed: u32 = value
            .parse()
            .map_err(|_| HistoryError::Malformed(format!("invalid point coordinate {value:?}")))?;
        match attribute.key.as_ref() {
            b"x" => x = Some(parsed),
            b"y" => y = Some(parsed),
            _ => {}
        }
    }
    match (x, y) {
        (Some(x), Some(y)) => Ok([x, y]),
        _ => Err(HistoryError::Malformed(
            "point element missing x or y attribute".to_owned(),
        )),
    }
}

fn parse_row(encoded: &str) -> Result<Vec<u8>, HistoryError> {
    encoded
        .split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| HistoryError::Malformed(format!("invalid tile code {token:?}")))
        })
        .collect()
}

fn parse_field(type_tag: &str, text: &str) -> Result<DataValue, HistoryError> {
    match type_tag {
        "int" => text
            .parse()
            .map(DataValue::Int)
            .map_err(|_| HistoryError::Malformed(format!("invalid int field {text:?}"))),
        "float" => text
            .parse()
            .map(DataValue::Float)
            .map_err(|_| HistoryError::Malformed(format!("invalid float field {text:?}"))),
        "str" => Ok(DataValue::Text(text.to_owned())),
        other => Err(HistoryError::Malformed(format!(
            "unknown field type {other:?}"
        ))),
    }
}
