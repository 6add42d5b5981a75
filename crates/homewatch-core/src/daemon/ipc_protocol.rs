use anyhow::{Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Message frame: [4 bytes length LE][JSON payload]
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IpcRequest {
    Ping,
    ListTasks,
    SetTaskField {
        name: String,
        field: String,
        value: String,
    },
    RemoveTask {
        name: String,
    },
    RunTask {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IpcResponse {
    Pong,
    Success(serde_json::Value),
    Error { code: i32, message: String },
}

impl IpcResponse {
    pub fn success<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::Success(value),
            Err(err) => Self::error(500, format!("Failed to serialize response: {}", err)),
        }
    }

    pub fn ok() -> Self {
        Self::Success(serde_json::json!({ "ok": true }))
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_vec(message)?;
    if json.len() > MAX_MESSAGE_SIZE {
        bail!("Message too large");
    }
    writer.write_all(&(json.len() as u32).to_le_bytes()).await?;
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame; `None` when the peer closed the connection.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    if reader.read_exact(&mut len_buf).await.is_err() {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        bail!("Message too large");
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(serde_json::from_slice(&buf)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_exchange() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let request = IpcRequest::SetTaskField {
            name: "Nightly".into(),
            field: "enabled".into(),
            value: "true".into(),
        };
        write_frame(&mut client, &request).await.unwrap();

        let received: Option<IpcRequest> = read_frame(&mut server).await.unwrap();
        assert_eq!(received, Some(request));

        drop(client);
        let closed: Option<IpcRequest> = read_frame(&mut server).await.unwrap();
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&((MAX_MESSAGE_SIZE as u32) + 1).to_le_bytes())
            .await
            .unwrap();
        let result: Result<Option<IpcRequest>> = read_frame(&mut server).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(IpcRequest::RemoveTask {
            name: "Nightly".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "RemoveTask", "data": {"name": "Nightly"}})
        );
        assert_eq!(
            serde_json::to_value(IpcRequest::Ping).unwrap(),
            serde_json::json!({"type": "Ping"})
        );
    }

    #[test]
    fn test_error_response() {
        let response: IpcResponse =
            serde_json::from_str(r#"{"type":"Error","data":{"code":404,"message":"gone"}}"#)
                .unwrap();
        assert_eq!(response, IpcResponse::error(404, "gone"));
    }
}
