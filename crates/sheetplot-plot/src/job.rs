//! 单个图框的出图任务
//!
//! 状态流转：`Pending → MediaMatched → Submitted → Verified`，
//! 任一步失败进入 `Failed`。任务只在一次运行内存在，不做持久化。

use crate::error::JobFailure;
use crate::media::MediaCandidate;
use sheetplot_core::frame::Frame;
use std::path::PathBuf;

/// 任务状态
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    MediaMatched { media: MediaCandidate },
    Submitted { path: PathBuf },
    Verified { path: PathBuf },
    Failed(JobFailure),
}

/// 出图任务
#[derive(Debug)]
pub struct PlotJob<'a> {
    frame: &'a Frame,
    state: JobState,
}

impl<'a> PlotJob<'a> {
    pub fn new(frame: &'a Frame) -> Self {
        Self {
            frame,
            state: JobState::Pending,
        }
    }

    pub fn frame(&self) -> &'a Frame {
        self.frame
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn media_matched(&mut self, media: MediaCandidate) {
        self.state = JobState::MediaMatched { media };
    }

    pub fn submitted(&mut self, path: PathBuf) {
        self.state = JobState::Submitted { path };
    }

    /// 确认文件已生成（只能从已提交状态进入）
    pub fn verified(&mut self) {
        if let JobState::Submitted { path } = &self.state {
            self.state = JobState::Verified { path: path.clone() };
        }
    }

    pub fn fail(&mut self, failure: JobFailure) {
        self.state = JobState::Failed(failure);
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.state, JobState::Verified { .. })
    }

    /// 结束任务，得到结果
    pub fn finish(self) -> JobOutcome {
        let result = match self.state {
            JobState::Verified { path } => Ok(path),
            JobState::Failed(failure) => Err(failure),
            other => Err(JobFailure::Device(format!("job stopped in state {:?}", other))),
        };

        JobOutcome {
            sheet_index: self.frame.sheet_index(),
            sheet_number: self.frame.sheet_number().to_string(),
            result,
        }
    }
}

/// 任务结果
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub sheet_index: u32,
    pub sheet_number: String,
    /// 成功时为输出文件路径
    pub result: Result<PathBuf, JobFailure>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
