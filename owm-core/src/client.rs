//! The fetch client.
//!
//! [`OpenWeather`] holds exactly one [`ForecastRecord`], replaced wholesale by every
//! successful fetch. A failed fetch leaves it untouched and clears [`OpenWeather::is_fresh`],
//! so check the fetch result (or `is_fresh`) before trusting the accessors.
//!
//! All fetches take `&mut self`: one request is in flight per client, and the client is
//! not meant to be shared between tasks.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument, trace, warn};

use crate::{
    error::FetchError,
    model::{ForecastKind, ForecastQuery, Location, Units},
    record::ForecastRecord,
    response::{ResponseBuffer, status_code},
    transport::{TcpTransport, Transport},
};

pub const DEFAULT_HOST: &str = "api.openweathermap.org";
pub const DEFAULT_PORT: u16 = 80;

const READ_CHUNK: usize = 512;

/// Everything a client needs besides its transport.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub units: Units,
    /// Bound on the wait for the first response byte.
    pub first_byte_timeout: Duration,
    /// Once data is flowing, a read idle for this long ends the response.
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            units: Units::default(),
            first_byte_timeout: Duration::from_millis(1000),
            read_timeout: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct OpenWeather<T: Transport = TcpTransport> {
    transport: T,
    settings: ClientSettings,
    record: ForecastRecord,
    entries: Vec<ForecastRecord>,
    fresh: bool,
}

impl OpenWeather<TcpTransport> {
    pub fn new(settings: ClientSettings) -> Self {
        let transport = TcpTransport::new(settings.connect_timeout);
        Self::with_transport(transport, settings)
    }
}

impl<T: Transport> OpenWeather<T> {
    pub fn with_transport(transport: T, settings: ClientSettings) -> Self {
        Self {
            transport,
            settings,
            record: ForecastRecord::default(),
            entries: Vec::new(),
            fresh: false,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn set_units(&mut self, units: Units) {
        self.settings.units = units;
    }

    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.settings.api_key = api_key;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The record of the last successful fetch; empty before the first one.
    pub fn record(&self) -> &ForecastRecord {
        &self.record
    }

    /// Every entry scraped by the last successful fetch, oldest first. For hourly and
    /// daily fetches the last one is [`Self::record`].
    pub fn entries(&self) -> &[ForecastRecord] {
        &self.entries
    }

    /// Whether the most recent fetch succeeded.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn fetch_current(
        &mut self,
        location: &Location,
    ) -> Result<&ForecastRecord, FetchError> {
        self.fetch(ForecastKind::Current, location, None).await
    }

    /// Three-hourly forecast; `count` entries are requested and the last one is published.
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn fetch_hourly(
        &mut self,
        location: &Location,
        count: u32,
    ) -> Result<&ForecastRecord, FetchError> {
        self.fetch(ForecastKind::Hourly, location, Some(count.max(1))).await
    }

    /// Daily forecast of at most 10 days; larger counts fail without touching the network.
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn fetch_daily(
        &mut self,
        location: &Location,
        count: u32,
    ) -> Result<&ForecastRecord, FetchError> {
        self.fetch(ForecastKind::Daily, location, Some(count.max(1))).await
    }

    async fn fetch(
        &mut self,
        kind: ForecastKind,
        location: &Location,
        count: Option<u32>,
    ) -> Result<&ForecastRecord, FetchError> {
        let query = ForecastQuery {
            kind,
            location,
            count,
            units: self.settings.units,
            api_key: self.settings.api_key.as_deref(),
        };
        if let Err(e) = query.validate() {
            self.fresh = false;
            return Err(e);
        }
        let request = query.http_request(&self.settings.host);

        let outcome = self.exchange(kind, count, request.as_bytes()).await;
        self.transport.close().await;

        match outcome {
            Ok((record, entries)) => {
                debug!(%kind, entries = entries.len(), "forecast updated");
                self.record = record;
                self.entries = entries;
                self.fresh = true;
                Ok(&self.record)
            }
            Err(e) => {
                warn!(%kind, error = %e, "fetch failed, keeping previous record");
                self.fresh = false;
                Err(e)
            }
        }
    }

    async fn exchange(
        &mut self,
        kind: ForecastKind,
        count: Option<u32>,
        request: &[u8],
    ) -> Result<(ForecastRecord, Vec<ForecastRecord>), FetchError> {
        let (host, port) = (self.settings.host.as_str(), self.settings.port);

        self.transport
            .connect(host, port)
            .await
            .map_err(|source| FetchError::ConnectionFailed {
                host: host.to_string(),
                port,
                source,
            })?;

        debug!(path = kind.path(), "sending request");
        self.transport.write_all(request).await?;

        let mut chunk = [0u8; READ_CHUNK];
        let first_byte_timeout = self.settings.first_byte_timeout;
        let first = match timeout(first_byte_timeout, self.transport.read(&mut chunk)).await {
            Ok(read) => read?,
            Err(_) => return Err(FetchError::Timeout(first_byte_timeout)),
        };
        if first == 0 {
            return Err(FetchError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "server closed the connection without responding",
            )));
        }

        match status_code(&chunk[..first]) {
            Some(status) if !(200..300).contains(&status) => {
                warn!(status, "server returned an error status, scraping anyway");
            }
            Some(status) => debug!(status, "response started"),
            None => debug!("response has no status line"),
        }

        let mut response = ResponseBuffer::new(kind, count);
        trace!(chunk = %String::from_utf8_lossy(&chunk[..first]), "response");
        response.push(&chunk[..first]);

        while !response.is_complete() {
            match timeout(self.settings.read_timeout, self.transport.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    trace!(chunk = %String::from_utf8_lossy(&chunk[..n]), "response");
                    response.push(&chunk[..n]);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    debug!("response went idle, parsing what arrived");
                    break;
                }
            }
        }

        Ok(response.finish())
    }
}
