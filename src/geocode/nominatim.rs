use super::{GeocodeError, Geocoder};
use crate::model::{Coordinate, GeocoderConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// One entry of a Nominatim `/search` response. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Geocoder backed by an OpenStreetMap Nominatim instance.
pub struct NominatimClient {
    http: reqwest::Client,
    search_url: String,
    country_codes: Option<String>,
}

impl NominatimClient {
    pub fn new(cfg: &GeocoderConfig) -> Result<Self> {
        // Nominatim's usage policy requires an identifying User-Agent.
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            search_url: format!("{}/search", cfg.base_url.trim_end_matches('/')),
            country_codes: cfg.country_codes.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> std::result::Result<Coordinate, GeocodeError> {
        let mut params = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
        if let Some(cc) = self.country_codes.as_deref() {
            params.push(("countrycodes", cc));
        }

        let resp = self
            .http
            .get(&self.search_url)
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Service(format!("HTTP {status}")));
        }
        let body = resp.text().await.map_err(transport_error)?;
        parse_first_place(&body)
    }
}

fn transport_error(e: reqwest::Error) -> GeocodeError {
    if e.is_timeout() {
        GeocodeError::Service("request timed out".into())
    } else if e.is_connect() {
        GeocodeError::Service("could not connect to search service".into())
    } else {
        GeocodeError::Service(e.to_string())
    }
}

/// Pick the first (best) match out of a `/search` body.
fn parse_first_place(body: &str) -> std::result::Result<Coordinate, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|e| GeocodeError::Service(format!("unreadable response: {e}")))?;
    let place = places.into_iter().next().ok_or(GeocodeError::NotFound)?;

    let lat = place.lat.trim().parse::<f64>();
    let lon = place.lon.trim().parse::<f64>();
    let (Ok(lat), Ok(lon)) = (lat, lon) else {
        return Err(GeocodeError::Service(format!(
            "bad coordinate in response: {}, {}",
            place.lat, place.lon
        )));
    };
    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(GeocodeError::Service(format!(
            "coordinate out of range: {coordinate}"
        )));
    }
    tracing::debug!(
        place = place.display_name.as_deref().unwrap_or("-"),
        %coordinate,
        "nominatim match"
    );
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn config(base_url: String) -> GeocoderConfig {
        GeocoderConfig {
            base_url,
            user_agent: "stakeout-mapper-test".into(),
            country_codes: Some("tw".into()),
            timeout: Duration::from_secs(5),
        }
    }

    /// Serve a single canned HTTP response; the request head is sent back
    /// through the returned channel.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (head_tx, head_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let mut head = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
            let _ = head_tx.send(String::from_utf8_lossy(&head).into_owned());
        });
        (format!("http://{addr}"), head_rx)
    }

    #[test]
    fn test_parse_first_place() {
        let body = r#"[
            {"place_id": 1, "lat": "22.9971", "lon": "120.2126", "display_name": "Tainan"},
            {"place_id": 2, "lat": "0", "lon": "0"}
        ]"#;
        assert_eq!(
            parse_first_place(body).unwrap(),
            Coordinate::new(22.9971, 120.2126)
        );
    }

    #[test]
    fn test_parse_empty_is_not_found() {
        assert_eq!(parse_first_place("[]"), Err(GeocodeError::NotFound));
    }

    #[test]
    fn test_parse_garbage_is_service_error() {
        assert!(matches!(
            parse_first_place("<html>busy</html>"),
            Err(GeocodeError::Service(_))
        ));
        assert!(matches!(
            parse_first_place(r#"[{"lat": "north", "lon": "120.2"}]"#),
            Err(GeocodeError::Service(_))
        ));
        assert!(matches!(
            parse_first_place(r#"[{"lat": "123.0", "lon": "120.2"}]"#),
            Err(GeocodeError::Service(_))
        ));
    }

    #[tokio::test]
    async fn test_geocode_found() {
        let (base, head_rx) =
            serve_once("200 OK", r#"[{"lat": "23.0", "lon": "120.2", "display_name": "x"}]"#)
                .await;
        let client = NominatimClient::new(&config(base)).unwrap();
        let c = client.geocode("Main St").await.unwrap();
        assert_eq!(c, Coordinate::new(23.0, 120.2));

        let head = head_rx.await.unwrap();
        assert!(head.starts_with("GET /search?"));
        assert!(head.contains("q=Main+St"));
        assert!(head.contains("format=jsonv2"));
        assert!(head.contains("limit=1"));
        assert!(head.contains("countrycodes=tw"));
        assert!(head.to_ascii_lowercase().contains("user-agent: stakeout-mapper-test"));
    }

    #[tokio::test]
    async fn test_geocode_no_match() {
        let (base, _head) = serve_once("200 OK", "[]").await;
        let client = NominatimClient::new(&config(base)).unwrap();
        assert_eq!(
            client.geocode("nonexistent-place-xyz").await,
            Err(GeocodeError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_geocode_server_error() {
        let (base, _head) = serve_once("503 Service Unavailable", "").await;
        let client = NominatimClient::new(&config(base)).unwrap();
        match client.geocode("Anping").await {
            Err(GeocodeError::Service(msg)) => assert!(msg.contains("503")),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_geocode_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = NominatimClient::new(&config(format!("http://{addr}/"))).unwrap();
        assert!(matches!(
            client.geocode("Anping").await,
            Err(GeocodeError::Service(_))
        ));
    }
}
