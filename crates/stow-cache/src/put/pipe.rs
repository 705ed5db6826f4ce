//! Archive-to-cache pipe
//!
//! The archiver is synchronous, so it runs on a blocking thread and hands
//! 64 KiB chunks over a bounded channel. The async side writes each chunk
//! into the cache before receiving the next, which keeps the archiver at the
//! pace of the cache writer.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cas::{CacheWriter, Integrity};
use crate::tarball::{create_tarball, ArchiveOptions};
use crate::{join_error, CacheResult};

const CHUNK_SIZE: usize = 64 * 1024;
const CHANNEL_DEPTH: usize = 4;

/// `Write` adapter that forwards full chunks over a bounded channel
struct ChannelWriter {
    sender: mpsc::Sender<Vec<u8>>,
    buffer: Vec<u8>,
}

impl ChannelWriter {
    fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            sender,
            buffer: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(CHUNK_SIZE));
        self.sender
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "cache writer stopped reading"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = CHUNK_SIZE - self.buffer.len();
        let taken = room.min(buf.len());
        self.buffer.extend_from_slice(&buf[..taken]);
        if self.buffer.len() == CHUNK_SIZE {
            self.send_buffer()?;
        }
        Ok(taken)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffer()
    }
}

/// Archive `entries` of `base_dir` into `writer` and commit it
///
/// A write failure on the cache side wins over the archiver's resulting
/// broken-pipe error.
pub(crate) async fn pipe_archive(
    base_dir: PathBuf,
    entries: Vec<PathBuf>,
    options: ArchiveOptions,
    mut writer: CacheWriter,
) -> CacheResult<Integrity> {
    let (sender, mut receiver) = mpsc::channel::<Vec<u8>>(CHANNEL_DEPTH);

    let producer = tokio::task::spawn_blocking(move || {
        create_tarball(ChannelWriter::new(sender), &base_dir, &entries, &options).map(|_| ())
    });

    let mut consumer_result = Ok(());
    while let Some(chunk) = receiver.recv().await {
        if let Err(e) = writer.write_all(&chunk).await {
            consumer_result = Err(e);
            break;
        }
    }
    // Unblocks the archiver if the cache side bailed out early
    drop(receiver);

    let producer_result = producer.await.map_err(|e| join_error("Archive", e))?;
    consumer_result?;
    producer_result?;

    debug!("Piped {} archive bytes into '{}'", writer.written(), writer.key());

    writer.commit().await
}

/// Archive a single file into `writer`
pub(crate) async fn pipe_file(
    directory: &Path,
    file_name: &Path,
    options: ArchiveOptions,
    writer: CacheWriter,
) -> CacheResult<Integrity> {
    pipe_archive(directory.to_path_buf(), vec![file_name.to_path_buf()], options, writer).await
}
