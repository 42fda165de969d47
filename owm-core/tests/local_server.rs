//! End-to-end fetches against a local HTTP/1.0 server serving canned XML.

use std::time::Duration;

use owm_core::{ClientSettings, FetchError, ForecastKind, Location, OpenWeather, Units};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

const CURRENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<current><city id="3128760" name="Barcelona"><coord lon="2.16" lat="41.39"/><country>ES</country><timezone>3600</timezone><sun rise="2024-03-01T06:07:12" set="2024-03-01T17:39:41"/></city><temperature value="14.2" min="12.1" max="16.0" unit="celsius"/><feels_like value="13.4" unit="celsius"/><humidity value="62" unit="%"/><pressure value="1018" unit="hPa"/><wind><speed value="3.6" unit="m/s" name="Gentle Breeze"/><gusts/><direction value="200" code="SSW" name="South-southwest"/></wind><clouds value="20" name="few clouds"/><visibility value="10000"/><precipitation mode="no"/><weather number="801" value="few clouds" icon="02d"/><lastupdate value="2024-03-01T11:20:00"/></current>"#;

fn daily_entry(day: &str, max: f32) -> String {
    format!(
        r#"<time day="{day}"><symbol number="500" name="light rain" var="10d"/><precipitation value="1.2" type="rain"/><windDirection deg="180" code="S" name="South"/><windSpeed mps="4.1" unit="m/s" name="Gentle Breeze"/><temperature day="{max}" min="8" max="{max}" night="9" eve="11" morn="8.5"/><pressure unit="hPa" value="1011"/><humidity value="80" unit="%"/><clouds value="overcast clouds" all="90" unit="%"/></time>"#
    )
}

/// Accepts one connection, captures the request head and answers with `body`.
async fn serve_once(body: String) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 256];
        while !request.ends_with(b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before finishing the request");
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!("HTTP/1.0 200 OK\r\nContent-Type: text/xml\r\n\r\n{body}");
        // The client may hang up once it has the entries it wants.
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;

        String::from_utf8(request).unwrap()
    });

    (port, handle)
}

fn settings(port: u16) -> ClientSettings {
    ClientSettings {
        host: "127.0.0.1".into(),
        port,
        units: Units::Metric,
        api_key: Some("TESTKEY".into()),
        first_byte_timeout: Duration::from_secs(2),
        ..ClientSettings::default()
    }
}

#[tokio::test]
async fn fetches_current_conditions() {
    let (port, server) = serve_once(CURRENT_XML.to_string()).await;
    let mut weather = OpenWeather::new(settings(port));

    let record = weather
        .fetch_current(&Location::CityName("Barcelona".into()))
        .await
        .unwrap();

    assert_eq!(record.kind(), Some(ForecastKind::Current));
    assert_eq!(record.temperature(), 14.2);
    assert_eq!(record.temperature_unit(), Some("celsius"));
    assert_eq!(record.humidity(), 62);
    assert_eq!(record.wind_direction(), Some("SSW"));
    assert_eq!(record.clouds(), 20);
    assert_eq!(record.condition_id(), 801);
    assert_eq!(record.precipitation_type(), None);
    assert_eq!(record.date(), Some("2024-03-01"));
    assert_eq!(record.time(), Some("11:20:00"));

    let request = server.await.unwrap();
    assert!(request.starts_with(
        "GET /data/2.5/weather?q=Barcelona&mode=xml&APPID=TESTKEY&units=metric HTTP/1.0\r\n"
    ));
    assert!(request.contains("Host: 127.0.0.1\r\n"));
    assert!(request.contains("Content-length: 0\r\n"));
}

#[tokio::test]
async fn fetches_daily_target_entry() {
    let body = format!(
        "<weatherdata><location><name>Barcelona</name></location><forecast>{}{}{}</forecast></weatherdata>",
        daily_entry("2024-03-01", 15.0),
        daily_entry("2024-03-02", 17.5),
        daily_entry("2024-03-03", 19.0),
    );
    let (port, server) = serve_once(body).await;
    let mut weather = OpenWeather::new(settings(port));

    let record = weather
        .fetch_daily(&Location::Coordinates { lat: 41.39, lon: 2.16 }, 2)
        .await
        .unwrap();

    assert_eq!(record.date(), Some("2024-03-02"));
    assert_eq!(record.time(), None);
    assert_eq!(record.max_temperature(), 17.5);
    assert_eq!(record.precipitation_type(), Some("rain"));
    assert_eq!(weather.entries().len(), 2);
    assert_eq!(weather.entries()[0].date(), Some("2024-03-01"));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /data/2.5/forecast/daily?lat=41.39&lon=2.16&cnt=2&mode=xml"));
}

#[tokio::test]
async fn refused_connection_reports_connection_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut weather = OpenWeather::new(settings(port));
    let err = weather.fetch_current(&Location::CityId(3128760)).await.unwrap_err();

    assert!(matches!(err, FetchError::ConnectionFailed { .. }));
    assert!(!weather.is_fresh());
    assert_eq!(weather.record().kind(), None);
}
