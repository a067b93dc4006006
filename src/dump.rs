use crate::bridge::{DragCommit, Frame};
use crate::displacement::DisplacementMap;
use crate::geometry::Rect;
use crate::snap::SnapGuide;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDump {
    pub sequence: u64,
    pub timestamp: f64,
    pub backend: String,
    pub drag: Option<DragDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragDump {
    pub element: String,
    pub container: Option<String>,
    pub proposed: Rect,
    pub x: f64,
    pub y: f64,
    pub guides: Vec<SnapGuide>,
    pub displacement: DisplacementMap,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDump {
    pub element: String,
    pub rect: Rect,
    pub displacement: DisplacementMap,
}

impl FrameDump {
    pub fn from_frame(frame: &Frame, backend: &str) -> Self {
        let drag = frame.drag.as_ref().map(|drag| DragDump {
            element: drag.element.clone(),
            container: drag.container.clone(),
            proposed: drag.proposed,
            x: drag.snap.x,
            y: drag.snap.y,
            guides: drag.snap.guides.clone(),
            displacement: drag.displacement.clone(),
        });
        FrameDump {
            sequence: frame.sequence,
            timestamp: frame.timestamp,
            backend: backend.to_string(),
            drag,
        }
    }
}

impl From<&DragCommit> for CommitDump {
    fn from(commit: &DragCommit) -> Self {
        CommitDump {
            element: commit.element.clone(),
            rect: commit.rect,
            displacement: commit.displacement.clone(),
        }
    }
}

/// Writes `value` as pretty JSON to `path`, or stdout when no path is given.
pub fn write_dump<T: Serialize>(value: &T, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
