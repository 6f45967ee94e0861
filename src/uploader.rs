//! # Panel Upload
//!
//! Drives the request sequence built by [`crate::protocol`] against the
//! panel. Requests go out strictly one after another: the firmware keeps
//! state between them and chunk order matters.
//!
//! ## Failure policy
//! The first failed request (connection error, timeout or non-2xx status)
//! aborts the transfer. Nothing is retried and no `SHOW_` is sent, so the
//! panel is left with a partial buffer until the next full transfer
//! overwrites it.

use crate::config::DeviceConfig;
use crate::dither::MonoImage;
use crate::protocol::{transfer_frames, Frame};
use crate::{CalendarError, TransportError};
use log::{debug, error, info};
use std::time::Duration;

/// One-way request channel to the panel
#[allow(async_fn_in_trait)]
pub trait DeviceTransport {
    /// POST an empty body to `path`, failing on anything but a 2xx answer
    async fn post(&mut self, path: &str, timeout: Duration) -> Result<(), TransportError>;
}

/// HTTP transport for panels reachable at `http://<address>/`
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(address: &str) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CalendarError::TransferFailure {
                stage: "client setup".to_string(),
                source: TransportError::Http(e),
            })?;
        Ok(Self {
            client,
            base_url: base_url(address),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn base_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        format!("{}/", address)
    } else {
        format!("http://{}/", address)
    }
}

impl DeviceTransport for HttpTransport {
    async fn post(&mut self, path: &str, timeout: Duration) -> Result<(), TransportError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(url)
            .body("")
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Summary of a completed transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReport {
    pub data_chunks: usize,
    pub encoded_chars: usize,
}

/// Send a bitmap to the panel: `EPDw_`, every `LOAD_` chunk, then `SHOW_`
pub async fn upload_bitmap<T: DeviceTransport>(
    transport: &mut T,
    bitmap: &MonoImage,
    device: &DeviceConfig,
) -> Result<TransferReport, CalendarError> {
    let frames = transfer_frames(bitmap, device.background_value, device.chunk_chars);
    let data_chunks = frames.len().saturating_sub(2);
    info!(
        "Uploading {}x{} bitmap in {} chunks",
        bitmap.width(),
        bitmap.height(),
        data_chunks
    );

    let mut encoded_chars = 0;
    for (index, frame) in frames.iter().enumerate() {
        let (stage, timeout) = match frame {
            Frame::Init => ("init command".to_string(), device.init_timeout()),
            Frame::Data(payload) => {
                encoded_chars += payload.len();
                (
                    format!("data chunk {}/{}", index, data_chunks),
                    device.chunk_timeout(),
                )
            }
            Frame::Show => ("show command".to_string(), device.show_timeout()),
        };

        let sent = match frame.path() {
            Ok(path) => transport.post(&path, timeout).await,
            Err(e) => Err(TransportError::from(e)),
        };
        if let Err(source) = sent {
            error!("Panel transfer aborted at {}: {}", stage, source);
            return Err(CalendarError::TransferFailure { stage, source });
        }
        debug!("Sent {} ({})", stage, frame);
    }

    info!("Upload complete, panel refreshing");
    Ok(TransferReport {
        data_chunks,
        encoded_chars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Records every path and refuses the request with the given index
    #[derive(Default)]
    struct RecordingTransport {
        paths: Vec<String>,
        timeouts: Vec<Duration>,
        fail_at: Option<usize>,
    }

    impl DeviceTransport for RecordingTransport {
        async fn post(&mut self, path: &str, timeout: Duration) -> Result<(), TransportError> {
            let index = self.paths.len();
            self.paths.push(path.to_string());
            self.timeouts.push(timeout);
            if self.fail_at == Some(index) {
                return Err(TransportError::Rejected(format!("request {} refused", index)));
            }
            Ok(())
        }
    }

    fn small_bitmap() -> MonoImage {
        // 16x2 pixels -> 4 packed bytes, first pixel ink
        let mut gray = GrayImage::from_pixel(16, 2, Luma([255]));
        gray.put_pixel(0, 0, Luma([0]));
        crate::dither::dither(gray, crate::dither::DitherMethod::Atkinson)
    }

    fn device(chunk_chars: usize) -> DeviceConfig {
        DeviceConfig {
            chunk_chars,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("192.168.1.159"), "http://192.168.1.159/");
        assert_eq!(base_url("http://panel.local/"), "http://panel.local/");
    }

    #[tokio::test]
    async fn test_sequence_order() {
        let mut transport = RecordingTransport::default();
        let report = upload_bitmap(&mut transport, &small_bitmap(), &device(4))
            .await
            .unwrap();

        assert_eq!(report.data_chunks, 2);
        assert_eq!(report.encoded_chars, 8);
        assert_eq!(
            transport.paths,
            vec!["EPDw_", "aiaaeaaaLOAD_", "aaaaeaaaLOAD_", "SHOW_"]
        );
        assert_eq!(
            transport.timeouts,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(9),
                Duration::from_secs(9),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_chunk_aborts_transfer() {
        let mut transport = RecordingTransport {
            fail_at: Some(2),
            ..Default::default()
        };
        let result = upload_bitmap(&mut transport, &small_bitmap(), &device(2)).await;

        match result {
            Err(CalendarError::TransferFailure { stage, .. }) => {
                assert_eq!(stage, "data chunk 2/4");
            }
            other => panic!("expected transfer failure, got {:?}", other),
        }
        // No further chunks and no SHOW_ after the failure
        assert_eq!(transport.paths.len(), 3);
        assert!(!transport.paths.iter().any(|p| p == "SHOW_"));
    }

    #[tokio::test]
    async fn test_failed_init_sends_nothing_else() {
        let mut transport = RecordingTransport {
            fail_at: Some(0),
            ..Default::default()
        };
        let result = upload_bitmap(&mut transport, &small_bitmap(), &device(1000)).await;
        assert!(matches!(
            result,
            Err(CalendarError::TransferFailure { ref stage, .. }) if stage == "init command"
        ));
        assert_eq!(transport.paths, vec!["EPDw_"]);
    }

    /// Minimal HTTP responder: answers each connection with the next status
    fn serve(statuses: Vec<u16>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for status in statuses {
                let (mut stream, _) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let text = String::from_utf8_lossy(&request);
                let line = text.lines().next().unwrap_or_default().to_string();
                tx.send(line).ok();
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status
                );
                stream.write_all(response.as_bytes()).ok();
            }
        });

        (address, rx)
    }

    #[tokio::test]
    async fn test_http_transfer() {
        let (address, requests) = serve(vec![200, 200, 200, 200]);
        let mut transport = HttpTransport::new(&address).unwrap();
        let report = upload_bitmap(&mut transport, &small_bitmap(), &device(4))
            .await
            .unwrap();
        assert_eq!(report.data_chunks, 2);

        let lines: Vec<String> = requests.try_iter().collect();
        assert_eq!(
            lines,
            vec![
                "POST /EPDw_ HTTP/1.1",
                "POST /aiaaeaaaLOAD_ HTTP/1.1",
                "POST /aaaaeaaaLOAD_ HTTP/1.1",
                "POST /SHOW_ HTTP/1.1",
            ]
        );
    }

    #[tokio::test]
    async fn test_http_error_status_aborts() {
        let (address, requests) = serve(vec![200, 500]);
        let mut transport = HttpTransport::new(&address).unwrap();
        let result = upload_bitmap(&mut transport, &small_bitmap(), &device(4)).await;

        assert!(matches!(
            result,
            Err(CalendarError::TransferFailure {
                source: TransportError::Http(_),
                ..
            })
        ));
        assert_eq!(requests.try_iter().count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_panel() {
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let mut transport = HttpTransport::new(&address).unwrap();
        let result = upload_bitmap(&mut transport, &small_bitmap(), &device(1000)).await;
        assert!(matches!(
            result,
            Err(CalendarError::TransferFailure { ref stage, .. }) if stage == "init command"
        ));
    }
}
