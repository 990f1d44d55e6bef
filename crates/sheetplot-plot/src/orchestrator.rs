//! 出图编排
//!
//! 构造时配置一次布局（设备、布满、居中、窗口模式、样式表），
//! 之后对每个图框顺序执行：匹配纸张 → 设置方向 → 设置窗口 → 输出 → 等待文件。
//! 单个图框失败只记录日志，不中断整个运行。

use crate::device::{LayoutConfig, PlotDevice, PlotRotation, PlotWindow};
use crate::error::{JobFailure, PlotError};
use crate::job::{JobOutcome, PlotJob};
use crate::media::find_media;
use crate::wait::{CancelToken, Clock, SystemClock, WaitPolicy};
use sheetplot_core::frame::Frame;
use sheetplot_core::math::Point2;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 默认样式表（单色）
pub const DEFAULT_STYLE_SHEET: &str = "monochrome.ctb";

/// 纸张匹配容差（图形单位）
pub const MEDIA_TOLERANCE: f64 = 10.0;

/// 出图参数
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub device_name: String,
    pub output_dir: PathBuf,
    pub style_sheet: String,
    pub media_tolerance: f64,
    pub wait: WaitPolicy,
}

impl PlotSettings {
    pub fn new(device_name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_name: device_name.into(),
            output_dir: output_dir.into(),
            style_sheet: DEFAULT_STYLE_SHEET.to_string(),
            media_tolerance: MEDIA_TOLERANCE,
            wait: WaitPolicy::default(),
        }
    }
}

/// 输出文件名：`Лист_<序号>_<宽>x<高>.pdf`
pub fn output_file_name(frame: &Frame) -> String {
    format!(
        "Лист_{}_{:.0}x{:.0}.pdf",
        frame.sheet_index(),
        frame.width(),
        frame.height()
    )
}

/// 进度与日志回调，每个任务结束后按顺序同步调用
#[derive(Default)]
pub struct RunHooks<'a> {
    on_progress: Option<Box<dyn FnMut(usize, usize) + 'a>>,
    on_log: Option<Box<dyn FnMut(&str) + 'a>>,
}

impl<'a> RunHooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进度回调：(已完成数, 总数)
    pub fn on_progress(mut self, f: impl FnMut(usize, usize) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// 日志回调
    pub fn on_log(mut self, f: impl FnMut(&str) + 'a) -> Self {
        self.on_log = Some(Box::new(f));
        self
    }

    fn job_finished(&mut self, done: usize, total: usize, line: &str) {
        if let Some(cb) = self.on_progress.as_mut() {
            cb(done, total);
        }
        if let Some(cb) = self.on_log.as_mut() {
            cb(line);
        }
    }
}

/// 一次运行的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// 确认生成文件的数量
    pub succeeded: usize,
    /// 每个图框一行日志
    pub log: Vec<String>,
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded
    }
}

/// 出图编排器
pub struct PlotOrchestrator<D: PlotDevice, C: Clock = SystemClock> {
    device: D,
    settings: PlotSettings,
    clock: C,
    cancel: CancelToken,
}

impl<D: PlotDevice> PlotOrchestrator<D, SystemClock> {
    /// 配置布局；设备不可用时失败
    pub fn new(device: D, settings: PlotSettings) -> Result<Self, PlotError> {
        Self::with_clock(device, settings, SystemClock)
    }
}

impl<D: PlotDevice, C: Clock> PlotOrchestrator<D, C> {
    /// 指定时间源
    pub fn with_clock(mut device: D, settings: PlotSettings, clock: C) -> Result<Self, PlotError> {
        let config = LayoutConfig::window_to_fit(&settings.device_name, &settings.style_sheet);
        device.configure(&config)?;

        std::fs::create_dir_all(&settings.output_dir).map_err(|source| PlotError::OutputDir {
            path: settings.output_dir.clone(),
            source,
        })?;

        info!(
            "Configured {} (style {}), output to {}",
            settings.device_name,
            settings.style_sheet,
            settings.output_dir.display()
        );

        Ok(Self {
            device,
            settings,
            clock,
            cancel: CancelToken::new(),
        })
    }

    /// 使用外部取消标记
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// 顺序输出所有图框
    pub fn run(&mut self, frames: &[Frame], hooks: &mut RunHooks<'_>) -> RunReport {
        let total = frames.len();
        let mut report = RunReport::default();

        for (i, frame) in frames.iter().enumerate() {
            let index = i + 1;
            let mut job = PlotJob::new(frame);

            if self.cancel.is_cancelled() {
                job.fail(JobFailure::Cancelled);
            } else {
                self.plot_frame(&mut job);
            }

            let outcome = job.finish();
            let line = match &outcome.result {
                Ok(path) => {
                    report.succeeded += 1;
                    debug!("Sheet {} written to {}", frame.sheet_index(), path.display());
                    format!("[{}/{}] success: sheet {}", index, total, frame.sheet_index())
                }
                Err(failure) => {
                    warn!("Sheet {} failed: {}", frame.sheet_index(), failure);
                    format!("[{}/{}] failed sheet {}: {}", index, total, frame.sheet_index(), failure)
                }
            };

            hooks.job_finished(index, total, &line);
            report.log.push(line);
            report.outcomes.push(outcome);
        }

        info!("Plotted {}/{} sheets", report.succeeded, total);

        report
    }

    /// 单个图框，失败原因写入任务状态
    fn plot_frame(&mut self, job: &mut PlotJob<'_>) {
        if let Err(failure) = self.try_plot_frame(job) {
            job.fail(failure);
        }
    }

    fn try_plot_frame(&mut self, job: &mut PlotJob<'_>) -> Result<(), JobFailure> {
        let frame = job.frame();
        let (width, height) = (frame.width(), frame.height());

        let media = find_media(&self.device, width, height, self.settings.media_tolerance)?
            .ok_or(JobFailure::MediaUnavailable { width, height })?;
        debug!("Sheet {} matched media {}", frame.sheet_index(), media.name);
        self.device.set_media(&media.name)?;
        job.media_matched(media);

        self.device
            .set_rotation(PlotRotation::for_extents(width, height))?;

        let (min, max) = (frame.min_corner(), frame.max_corner());
        self.device.set_window(&PlotWindow::new(
            Point2::new(min.x, min.y),
            Point2::new(max.x, max.y),
        ))?;

        let path = self.output_path(frame);
        remove_stale_output(&path)?;
        self.device.plot_to_file(&path)?;
        job.submitted(path.clone());

        self.settings
            .wait
            .wait_for_file(&path, &self.clock, &self.cancel)?;
        job.verified();

        Ok(())
    }

    fn output_path(&self, frame: &Frame) -> PathBuf {
        self.settings.output_dir.join(output_file_name(frame))
    }
}

/// 删除上次运行留下的同名文件，只有设备新写出的文件才算完成
fn remove_stale_output(path: &Path) -> Result<(), JobFailure> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale output {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(JobFailure::Device(format!(
            "cannot remove existing {}: {}",
            path.display(),
            err
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, ManualClock};
    use sheetplot_core::math::{BoundingBox3, Point3};
    use std::time::Duration;

    fn frame(index: u32, x: f64, w: f64, h: f64) -> Frame {
        Frame::new(
            index,
            index.to_string(),
            "A2",
            BoundingBox3::new(Point3::new(x, 0.25, 0.0), Point3::new(x + w, h + 0.25, 3.0)),
        )
    }

    fn device() -> FakeDevice {
        FakeDevice::with_media(&[("ISO_A4", 210.0, 297.0), ("A2", 420.0, 594.0)])
    }

    fn settings(dir: &Path) -> PlotSettings {
        PlotSettings::new("DWG To PDF.pc3", dir)
    }

    #[test]
    fn test_configures_layout_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = device();
        {
            let mut orchestrator =
                PlotOrchestrator::with_clock(&mut device, settings(dir.path()), ManualClock::new()).unwrap();
            orchestrator.run(&[frame(1, 0.0, 594.0, 420.0), frame(2, 700.0, 210.0, 297.0)], &mut RunHooks::new());
        }

        assert_eq!(device.configured.len(), 1);
        let config = &device.configured[0];
        assert_eq!(config.device_name, "DWG To PDF.pc3");
        assert_eq!(config.style_sheet, "monochrome.ctb");
        assert!(config.scale_to_fit && config.center_plot);
    }

    #[test]
    fn test_swapped_media_landscape() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = device();
        let report = {
            let mut orchestrator =
                PlotOrchestrator::with_clock(&mut device, settings(dir.path()), ManualClock::new()).unwrap();
            orchestrator.run(&[frame(1, 0.0, 594.0, 420.0)], &mut RunHooks::new())
        };

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.log, vec!["[1/1] success: sheet 1".to_string()]);

        let submission = &device.submissions[0];
        assert_eq!(submission.media.as_deref(), Some("A2"));
        assert_eq!(submission.rotation, PlotRotation::Landscape);
        assert_eq!(submission.path, dir.path().join("Лист_1_594x420.pdf"));
        // 窗口取原始角点，不用取整后的宽高
        let window = submission.window.unwrap();
        assert_eq!(window.lower_left, Point2::new(0.0, 0.25));
        assert_eq!(window.upper_right, Point2::new(594.0, 420.25));
    }

    #[test]
    fn test_portrait_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = device();
        {
            let mut orchestrator =
                PlotOrchestrator::with_clock(&mut device, settings(dir.path()), ManualClock::new()).unwrap();
            orchestrator.run(&[frame(4, 0.0, 210.0, 297.0)], &mut RunHooks::new());
        }
        assert_eq!(device.submissions[0].rotation, PlotRotation::Portrait);
        assert_eq!(device.submissions[0].media.as_deref(), Some("ISO_A4"));
    }

    #[test]
    fn test_missing_media_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator =
            PlotOrchestrator::with_clock(device(), settings(dir.path()), ManualClock::new()).unwrap();
        let report = orchestrator.run(
            &[frame(1, 0.0, 1000.0, 700.0), frame(2, 2000.0, 594.0, 420.0)],
            &mut RunHooks::new(),
        );

        assert_eq!(report.succeeded, 1);
        assert_eq!(
            report.log,
            vec![
                "[1/2] failed sheet 1: format 1000x700 not available on device".to_string(),
                "[2/2] success: sheet 2".to_string(),
            ]
        );
        assert_eq!(orchestrator.device().submissions.len(), 1);
    }

    #[test]
    fn test_render_timeout_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = device();
        device.silent_outputs.push("Лист_1_594x420.pdf".to_string());

        let clock = ManualClock::new();
        let mut orchestrator =
            PlotOrchestrator::with_clock(device, settings(dir.path()), &clock).unwrap();
        let report = orchestrator.run(
            &[frame(1, 0.0, 594.0, 420.0), frame(2, 700.0, 594.0, 420.0)],
            &mut RunHooks::new(),
        );

        assert_eq!(report.succeeded, 1);
        assert!(report.log[0].starts_with("[1/2] failed sheet 1: timed out after 30s"));
        assert_eq!(report.log[1], "[2/2] success: sheet 2");
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobFailure::RenderTimeout { .. })
        ));
        assert_eq!(clock.elapsed(), Duration::from_secs(30));
    }

    #[test]
    fn test_leftover_output_is_not_success() {
        let dir = tempfile::tempdir().unwrap();
        let leftover = dir.path().join("Лист_1_594x420.pdf");
        std::fs::write(&leftover, b"%PDF-1.4 old").unwrap();

        let mut device = device();
        device.silent_outputs.push("Лист_1_594x420.pdf".to_string());

        let mut orchestrator =
            PlotOrchestrator::with_clock(device, settings(dir.path()), ManualClock::new()).unwrap();
        let report = orchestrator.run(&[frame(1, 0.0, 594.0, 420.0)], &mut RunHooks::new());

        assert_eq!(report.succeeded, 0);
        assert!(matches!(
            report.outcomes[0].result,
            Err(JobFailure::RenderTimeout { .. })
        ));
        assert!(!leftover.exists());
    }

    #[test]
    fn test_leftover_output_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Лист_1_594x420.pdf");
        std::fs::write(&path, b"old").unwrap();

        let mut orchestrator =
            PlotOrchestrator::with_clock(device(), settings(dir.path()), ManualClock::new()).unwrap();
        let report = orchestrator.run(&[frame(1, 0.0, 594.0, 420.0)], &mut RunHooks::new());

        assert_eq!(report.succeeded, 1);
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_unremovable_output_is_device_failure() {
        let dir = tempfile::tempdir().unwrap();
        // 同名目录无法用 remove_file 删除
        std::fs::create_dir(dir.path().join("Лист_1_594x420.pdf")).unwrap();

        let mut orchestrator =
            PlotOrchestrator::with_clock(device(), settings(dir.path()), ManualClock::new()).unwrap();
        let report = orchestrator.run(&[frame(1, 0.0, 594.0, 420.0)], &mut RunHooks::new());

        assert_eq!(report.succeeded, 0);
        assert!(report.log[0].starts_with("[1/1] failed sheet 1: device error: cannot remove existing"));
        assert!(orchestrator.device().submissions.is_empty());
    }

    #[test]
    fn test_device_error_is_job_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = device();
        device.rejected_outputs.push("Лист_1_594x420.pdf".to_string());

        let mut orchestrator =
            PlotOrchestrator::with_clock(device, settings(dir.path()), ManualClock::new()).unwrap();
        let report = orchestrator.run(&[frame(1, 0.0, 594.0, 420.0)], &mut RunHooks::new());

        assert_eq!(report.succeeded, 0);
        assert!(report.log[0].starts_with("[1/1] failed sheet 1: device error"));
    }

    #[test]
    fn test_every_frame_logged_once_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<_> = (1..=6)
            .map(|i| {
                if i % 2 == 0 {
                    frame(i, i as f64 * 1000.0, 594.0, 420.0)
                } else {
                    frame(i, i as f64 * 1000.0, 333.0, 333.0)
                }
            })
            .collect();

        let mut progress = Vec::new();
        let mut lines = Vec::new();
        let report = {
            let mut hooks = RunHooks::new()
                .on_progress(|done, total| progress.push((done, total)))
                .on_log(|line| lines.push(line.to_string()));
            let mut orchestrator =
                PlotOrchestrator::with_clock(device(), settings(dir.path()), ManualClock::new()).unwrap();
            orchestrator.run(&frames, &mut hooks)
        };

        assert_eq!(report.total(), 6);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed(), 3);
        assert_eq!(report.log, lines);
        assert_eq!(progress, (1..=6).map(|i| (i, 6)).collect::<Vec<_>>());
        let indices: Vec<_> = report.outcomes.iter().map(|o| o.sheet_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_cancel_between_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let mut orchestrator =
            PlotOrchestrator::with_clock(device(), settings(dir.path()), ManualClock::new())
                .unwrap()
                .with_cancel_token(cancel.clone());

        let frames = [frame(1, 0.0, 594.0, 420.0), frame(2, 700.0, 594.0, 420.0)];
        let report = {
            let mut hooks = RunHooks::new().on_progress(|done, _| {
                if done == 1 {
                    cancel.cancel();
                }
            });
            orchestrator.run(&frames, &mut hooks)
        };

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.log[1], "[2/2] failed sheet 2: cancelled");
        assert_eq!(orchestrator.device().submissions.len(), 1);
    }

    #[test]
    fn test_unreachable_device() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = device();
        device.unreachable = true;

        let result = PlotOrchestrator::new(device, settings(dir.path()));
        assert!(matches!(result, Err(PlotError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_unknown_device_name() {
        let dir = tempfile::tempdir().unwrap();
        let result = PlotOrchestrator::new(device(), PlotSettings::new("Plotter9000", dir.path()));
        assert!(matches!(result, Err(PlotError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_file_name_pattern() {
        let frame = Frame::new(
            12,
            "5",
            "A3",
            BoundingBox3::new(Point3::origin(), Point3::new(42000.4, 29699.6, 0.0)),
        );
        assert_eq!(output_file_name(&frame), "Лист_12_42000x29700.pdf");
    }
}
