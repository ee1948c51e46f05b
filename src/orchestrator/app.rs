//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、错误特征缓存、各项能力、按键监听、控制台
//! 2. **加载数据**：读取表格并按城市 / Backlog 过滤
//! 3. **运行**：把记录交给 `CycleRunner`
//! 4. **统计**：输出最终结果
//!
//! 只有本模块持有具体实现（剪贴板、键盘、屏幕、窗口），下层只看到 trait。

use crate::config::Config;
use crate::models::{load_records, RecordFilter, RecordSource};
use crate::orchestrator::console;
use crate::orchestrator::cycle_runner::{CycleRunner, RunReport, RunnerSettings};
use crate::services::{ErrorDetector, InterruptMonitor, PasteSubmit, SignatureCache, WindowFocus};
use crate::utils::logging::{init_log_file, log_records_loaded, log_startup, print_final_stats};
use crate::workflow::{LogObserver, PauseCoordinator};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 应用主结构
pub struct App {
    config: Config,
    runner: CycleRunner,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let observer =
            Arc::new(LogObserver::new(&config.output_log_file).with_bell(config.sound_alerts));
        let coordinator = Arc::new(PauseCoordinator::new(
            observer.clone(),
            Duration::from_millis(config.pause_poll_ms.max(1)),
            config.delay_seconds,
        ));

        // 错误特征只加载一次
        let cache = SignatureCache::shared(&config);
        let detector = Arc::new(ErrorDetector::from_cache(&cache, &config));

        let runner = CycleRunner::new(
            Arc::new(PasteSubmit::new()),
            detector,
            Arc::new(WindowFocus::from_config(&config)),
            coordinator.clone(),
            observer,
            RunnerSettings::from(&config),
        );

        let monitor = InterruptMonitor::from_config(&config)?;
        let pause_target = coordinator.clone();
        monitor.start(move || {
            pause_target.request_pause("[中断键] 请求暂停，等待当前记录结束");
        });

        console::spawn(coordinator);

        Ok(Self { config, runner })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunReport> {
        let filter = RecordFilter::new(&self.config.city_filter, &self.config.backlog_filter);
        let records = load_records(Path::new(&self.config.data_file), &filter).await?;

        log_records_loaded(records.count());

        let report = self.runner.run(&records).await;
        info!("运行结果: {:?}", report.state);

        print_final_stats(&report, &self.config.output_log_file);

        Ok(report)
    }
}
