use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Result;
use blobfs_core::{BlobFs, NodeId, NodeKind};
use clap::{Args, Subcommand};
use tracing::info;

#[derive(Args)]
pub struct CreateOptions {
    /// Node ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Human-readable name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Parent directory ID
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Block size for this node (defaults to the filesystem setting)
    #[arg(long)]
    pub block_size: Option<u32>,
}

#[derive(Args)]
pub struct WriteOptions {
    /// Node ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Input file, or `-` for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Byte position to write at (defaults to the end of the blob)
    #[arg(long)]
    pub at: Option<u64>,
}

#[derive(Args)]
pub struct CatOptions {
    /// Node ID
    #[arg(value_name = "ID")]
    pub id: String,

    /// Byte position to start reading at
    #[arg(long, default_value_t = 0)]
    pub at: u64,

    /// Maximum number of bytes to print
    #[arg(long)]
    pub len: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a directory node
    Mkdir(CreateOptions),

    /// Create an empty file node
    Touch(CreateOptions),

    /// Write a file's content into a blob
    Write(WriteOptions),

    /// Print blob content
    Cat(CatOptions),

    /// Print node metadata as JSON
    Stat {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List the children of a directory
    Ls {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Remove a node and its blocks
    Rm {
        #[arg(value_name = "ID")]
        id: String,
    },
}

impl Commands {
    pub async fn run<W: Write>(self, fs: &BlobFs, out: &mut W) -> Result<()> {
        match self {
            Commands::Mkdir(opts) => Self::create(fs, opts, NodeKind::Directory).await,
            Commands::Touch(opts) => Self::create(fs, opts, NodeKind::File).await,
            Commands::Write(opts) => Self::write(fs, opts, out).await,
            Commands::Cat(opts) => Self::cat(fs, opts, out).await,
            Commands::Stat { id } => {
                let meta = fs.stat(&NodeId::from(id)).await?;
                writeln!(out, "{}", serde_json::to_string_pretty(&meta)?)?;
                Ok(())
            }
            Commands::Ls { id } => {
                for child in fs.children(&NodeId::from(id)).await? {
                    let meta = fs.stat(&child).await?;
                    writeln!(out, "{}\t{}\t{}\t{}", child, meta.kind, meta.size, meta.name)?;
                }
                Ok(())
            }
            Commands::Rm { id } => {
                fs.remove_node(&NodeId::from(id)).await?;
                Ok(())
            }
        }
    }

    async fn create(fs: &BlobFs, opts: CreateOptions, kind: NodeKind) -> Result<()> {
        let id = NodeId::from(opts.id);
        let parent = opts.parent.map(NodeId::from);
        let block_size = opts.block_size.unwrap_or(fs.settings().block_size);
        fs.create_node_with_block_size(&id, &opts.name, kind, block_size, parent.as_ref())
            .await?;
        Ok(())
    }

    async fn write<W: Write>(fs: &BlobFs, opts: WriteOptions, out: &mut W) -> Result<()> {
        let data = if opts.input.as_os_str() == "-" {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data)?;
            data
        } else {
            std::fs::read(&opts.input)?
        };

        let id = NodeId::from(opts.id);
        let mut cursor = fs.open_cursor(&id).await?;
        let position = opts.at.unwrap_or(cursor.size());
        let written = cursor.write_at(position, &data).await?;
        cursor.close().await?;

        info!(node = %id, position, written, "wrote blob");
        writeln!(out, "{} bytes written, size {}", written, cursor.size())?;
        Ok(())
    }

    async fn cat<W: Write>(fs: &BlobFs, opts: CatOptions, out: &mut W) -> Result<()> {
        let mut cursor = fs.open_cursor(&NodeId::from(opts.id)).await?;
        cursor.seek(opts.at).await?;

        let mut remaining = opts.len.unwrap_or(u64::MAX);
        let mut buf = vec![0u8; cursor.block_size() as usize];
        while remaining > 0 && !cursor.eof() {
            let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let n = cursor.read(&mut buf[..want]).await?;
            out.write_all(&buf[..n])?;
            remaining -= n as u64;
        }
        cursor.close().await?;
        out.flush()?;
        Ok(())
    }
}
