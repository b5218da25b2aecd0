//! Background autosave
//!
//! The tick thread serializes a snapshot and hands the finished JSON to a
//! tokio task, which does the disk IO. The task never sees the world itself.

use std::path::PathBuf;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::error::Result;
use crate::core::types::Tick;
use crate::ecs::world::World;

#[derive(Debug)]
enum AutosaveCommand {
    Persist { tick: Tick, json: String },
    Shutdown,
}

#[derive(Debug)]
pub struct AutosaveWorker {
    tx: mpsc::UnboundedSender<AutosaveCommand>,
    handle: Option<JoinHandle<usize>>,
    path: PathBuf,
}

impl AutosaveWorker {
    /// Start the writer task on `runtime`. Snapshots go to `path`.
    pub fn start(runtime: &Handle, path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AutosaveCommand>();
        let target = path.clone();
        let handle = runtime.spawn(async move {
            let mut written = 0;
            while let Some(command) = rx.recv().await {
                match command {
                    AutosaveCommand::Persist { tick, json } => match write_atomically(&target, json).await {
                        Ok(()) => {
                            written += 1;
                            tracing::debug!(tick, path = %target.display(), "autosave written");
                        }
                        Err(err) => tracing::warn!(tick, %err, "autosave failed"),
                    },
                    AutosaveCommand::Shutdown => break,
                }
            }
            written
        });
        Self {
            tx,
            handle: Some(handle),
            path,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Serialize the world now and queue the write. Returns false if the
    /// writer has already stopped.
    pub fn submit(&self, world: &World) -> Result<bool> {
        let json = world.save()?.to_json()?;
        let tick = world.current_tick();
        let queued = self.tx.send(AutosaveCommand::Persist { tick, json }).is_ok();
        if !queued {
            tracing::warn!(tick, "autosave worker gone; snapshot dropped");
        }
        Ok(queued)
    }

    /// Finish pending writes and stop. Returns how many snapshots were written.
    pub async fn shutdown(mut self) -> usize {
        let _ = self.tx.send(AutosaveCommand::Shutdown);
        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(written) => written,
                Err(err) => {
                    tracing::warn!(%err, "autosave worker panicked");
                    0
                }
            },
            None => 0,
        }
    }
}

async fn write_atomically(path: &PathBuf, json: String) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TilePos;
    use crate::persistence::SaveDocument;

    #[tokio::test]
    async fn test_snapshots_written_off_thread() {
        let path = std::env::temp_dir().join(format!("colony_autosave_{}.json", std::process::id()));
        let worker = AutosaveWorker::start(&Handle::current(), path.clone());

        let mut world = World::default();
        world.spawn_settler("Urist", TilePos::new(1, 1)).unwrap();
        assert!(worker.submit(&world).unwrap());
        world.tick(1.0);
        assert!(worker.submit(&world).unwrap());

        assert_eq!(worker.shutdown().await, 2);
        let doc = SaveDocument::read_file(&path).unwrap();
        assert_eq!(doc.clock.current_tick(), 1);
        assert_eq!(doc.entities.len(), 1);
        if let Err(err) = std::fs::remove_file(&path) {
            tracing::warn!(%err, path = %path.display(), "could not remove autosave file");
        }
    }
}
