//! Proof data from standard input.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use prooflink_core::{Error, Result};

/// Interactive prompt shown before reading proof data.
pub const PROMPT: &str = "Enter proof data (or press Enter to use default): ";

/// Write the prompt to `writer`, then read one line from `reader`.
pub async fn prompt_and_read<R, W>(reader: R, mut writer: W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(PROMPT.as_bytes())
        .await
        .map_err(input_error)?;
    writer.flush().await.map_err(input_error)?;
    read_proof_line(reader).await
}

/// Read one line of proof data.
///
/// A final line without a newline is accepted. End of input before any byte
/// is an error, as is non-UTF-8 input.
pub async fn read_proof_line<R>(mut reader: R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.map_err(input_error)?;
    if n == 0 {
        return Err(Error::Input {
            message: "end of input before a line was read".to_string(),
        });
    }
    Ok(line)
}

fn input_error(err: std::io::Error) -> Error {
    Error::Input {
        message: err.to_string(),
    }
}
