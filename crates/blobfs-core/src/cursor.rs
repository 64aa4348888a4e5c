//! Random-access cursor over a chunked blob
//!
//! A [`Cursor`] maps absolute byte positions onto fixed-size block records.
//! At most one block is resident at a time; moving to another block flushes
//! the resident one first if it is dirty. Blocks at or past
//! `ceil(size / block_size)` have never been written and are allocated as
//! zero-filled buffers in memory, reaching the store only on flush.
//!
//! Size growth is kept in memory and persisted on [`Cursor::flush`] or
//! [`Cursor::close`]. A cursor is not shareable: every operation takes
//! `&mut self`, and two cursors on the same node must not be open at once.

use tracing::{debug, warn};

use crate::block::BlockStore;
use crate::error::{BlobFsError, BlobFsResult};
use crate::node::NodeStore;
use crate::types::{block_count, NodeId};

/// The single resident block
#[derive(Debug)]
struct CachedBlock {
    index: u64,
    data: Vec<u8>,
    dirty: bool,
}

/// Open handle on a file node
pub struct Cursor {
    id: NodeId,
    nodes: NodeStore,
    blocks: BlockStore,
    block_size: u64,
    size: u64,
    position: u64,
    cached: Option<CachedBlock>,
    header_dirty: bool,
    closed: bool,
}

impl Cursor {
    /// Open a cursor at position 0 with nothing cached.
    pub async fn open(nodes: &NodeStore, id: &NodeId) -> BlobFsResult<Self> {
        let meta = nodes.get_node(id).await?;
        if meta.is_dir() {
            return Err(BlobFsError::IsADirectory(id.clone()));
        }
        debug!(node = %id, size = meta.size, block_size = meta.block_size, "opened cursor");

        Ok(Self {
            id: id.clone(),
            nodes: nodes.clone(),
            blocks: nodes.blocks(id, meta.block_size),
            block_size: u64::from(meta.block_size),
            size: meta.size,
            position: 0,
            cached: None,
            header_dirty: false,
            closed: false,
        })
    }

    pub fn node_id(&self) -> &NodeId {
        &self.id
    }

    pub fn block_size(&self) -> u32 {
        self.blocks.block_size()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Logical size, including growth not yet persisted.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn eof(&self) -> bool {
        self.position >= self.size
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Move to `position`. Seeking to exactly `size` is the append point.
    pub async fn seek(&mut self, position: u64) -> BlobFsResult<()> {
        self.ensure_open()?;
        if position > self.size {
            return Err(BlobFsError::InvalidPosition {
                position,
                size: self.size,
            });
        }

        let target = position / self.block_size;
        if self.cached.as_ref().is_some_and(|block| block.index != target) {
            self.evict().await?;
        }
        debug!(node = %self.id, from = self.position, to = position, "seek");
        self.position = position;
        Ok(())
    }

    /// Read into `buf` from the current position, stopping early at `size`.
    pub async fn read(&mut self, buf: &mut [u8]) -> BlobFsResult<usize> {
        self.ensure_open()?;
        let mut done = 0;

        while done < buf.len() && self.position < self.size {
            let index = self.position / self.block_size;
            let offset = self.index_in_block();
            let available = usize::try_from(self.size - self.position).unwrap_or(usize::MAX);
            let n = (buf.len() - done)
                .min(self.block_size as usize - offset)
                .min(available);

            let block = self.activate(index).await?;
            buf[done..done + n].copy_from_slice(&block.data[offset..offset + n]);

            done += n;
            self.position += n as u64;
        }

        Ok(done)
    }

    /// Seek to `position`, then read.
    pub async fn read_at(&mut self, position: u64, buf: &mut [u8]) -> BlobFsResult<usize> {
        self.seek(position).await?;
        self.read(buf).await
    }

    /// Write all of `data` at the current position, growing `size` for the
    /// part that lands past the old end.
    pub async fn write(&mut self, data: &[u8]) -> BlobFsResult<usize> {
        self.ensure_open()?;
        let mut done = 0;

        while done < data.len() {
            let index = self.position / self.block_size;
            let offset = self.index_in_block();
            let n = (data.len() - done).min(self.block_size as usize - offset);

            let block = self.activate(index).await?;
            block.data[offset..offset + n].copy_from_slice(&data[done..done + n]);
            block.dirty = true;

            done += n;
            self.position += n as u64;
            if self.position > self.size {
                self.size = self.position;
                self.header_dirty = true;
            }
        }

        Ok(done)
    }

    /// Seek to `position`, then write.
    pub async fn write_at(&mut self, position: u64, data: &[u8]) -> BlobFsResult<usize> {
        self.seek(position).await?;
        self.write(data).await
    }

    /// Persist the resident block if dirty, then the size if it grew. The
    /// block stays resident.
    pub async fn flush(&mut self) -> BlobFsResult<()> {
        self.ensure_open()?;
        self.flush_block().await?;
        if self.header_dirty {
            self.nodes.update_size(&self.id, self.size).await?;
            self.header_dirty = false;
        }
        Ok(())
    }

    /// Flush and release the cursor. Closing twice is a no-op. If flushing
    /// fails the cursor stays open so the close can be retried; blocks
    /// flushed before the failure remain valid.
    pub async fn close(&mut self) -> BlobFsResult<()> {
        if self.closed {
            return Ok(());
        }
        self.flush().await?;
        self.cached = None;
        self.closed = true;
        debug!(node = %self.id, size = self.size, "closed cursor");
        Ok(())
    }

    fn ensure_open(&self) -> BlobFsResult<()> {
        if self.closed {
            return Err(BlobFsError::Closed);
        }
        Ok(())
    }

    fn index_in_block(&self) -> usize {
        (self.position % self.block_size) as usize
    }

    fn is_dirty(&self) -> bool {
        self.header_dirty || self.cached.as_ref().is_some_and(|block| block.dirty)
    }

    /// Make block `index` resident, swapping out the current one.
    async fn activate(&mut self, index: u64) -> BlobFsResult<&mut CachedBlock> {
        let block = match self.cached.take() {
            Some(block) if block.index == index => block,
            other => {
                self.cached = other;
                self.evict().await?;
                CachedBlock {
                    index,
                    data: self.fetch(index).await?,
                    dirty: false,
                }
            }
        };
        Ok(self.cached.insert(block))
    }

    async fn fetch(&self, index: u64) -> BlobFsResult<Vec<u8>> {
        if index < block_count(self.size, self.blocks.block_size()) {
            return self
                .blocks
                .load(index)
                .await?
                .ok_or_else(|| BlobFsError::CorruptState {
                    node: self.id.clone(),
                    block: index,
                });
        }
        debug!(node = %self.id, block = index, "allocated block");
        Ok(vec![0; self.block_size as usize])
    }

    async fn flush_block(&mut self) -> BlobFsResult<()> {
        if let Some(block) = self.cached.as_mut() {
            if block.dirty {
                self.blocks.store(block.index, &block.data).await?;
                block.dirty = false;
            }
        }
        Ok(())
    }

    async fn evict(&mut self) -> BlobFsResult<()> {
        self.flush_block().await?;
        self.cached = None;
        Ok(())
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if !self.closed && self.is_dirty() {
            warn!(node = %self.id, size = self.size, "cursor dropped with unflushed changes");
        }
    }
}
