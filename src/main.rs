use pose_rep_counter::camera::{FrameBufferPool, FrameMetadata, FrameScheduler};
use pose_rep_counter::config::Configuration;
use pose_rep_counter::error::AppError;
use pose_rep_counter::pipeline::classification::{PoseClassifierProcessor, load_pose_samples_from_path};
use pose_rep_counter::pipeline::{
    PosePipelineProcessor, ProcessorHandle, ReplayLandmarkSource, TracingResultSink,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

fn build_scheduler(configuration: &Configuration) -> Result<FrameScheduler, AppError> {
    let samples_config = &configuration.samples;
    let samples = load_pose_samples_from_path(&samples_config.path, &samples_config.separator)?;
    let landmark_source = ReplayLandmarkSource::from_reader(
        BufReader::new(File::open(&samples_config.path)?),
        &samples_config.separator,
    );
    tracing::info!("Replaying {} recorded poses", landmark_source.len());

    let processor = PosePipelineProcessor::new(
        Box::new(landmark_source),
        PoseClassifierProcessor::new(samples, configuration),
        Arc::new(TracingResultSink),
    );

    let scheduler_config = &configuration.scheduler;
    let pool = Arc::new(FrameBufferPool::for_frame(
        scheduler_config.frame_width,
        scheduler_config.frame_height,
        scheduler_config.bits_per_pixel,
        scheduler_config.buffer_count,
    ));
    let metadata = FrameMetadata::builder()
        .width(scheduler_config.frame_width)
        .height(scheduler_config.frame_height)
        .rotation_degrees(scheduler_config.rotation_degrees)
        .build();

    Ok(FrameScheduler::new(
        pool,
        ProcessorHandle::new(Box::new(processor)),
        metadata,
    ))
}

/// Fills pool buffers at the camera rate and hands them to the scheduler.
async fn run_camera(scheduler: &FrameScheduler, target_fps: u32) {
    let mut interval = tokio::time::interval(Duration::from_secs(1) / target_fps);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut frame_number: u64 = 0;
    loop {
        interval.tick().await;
        let Some(mut frame) = scheduler.pool().acquire() else {
            tracing::debug!("No free frame buffer, dropping camera frame");
            continue;
        };
        frame_number += 1;
        let marker = frame_number.to_le_bytes();
        let len = marker.len().min(frame.len());
        frame.data_mut()[..len].copy_from_slice(&marker[..len]);
        scheduler.submit(frame);
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let configuration = Configuration::load(config_path.as_deref())?;
    tracing::info!(
        "Starting repetition counter for {:?} ({} mode)",
        configuration.pose_classes,
        if configuration.stream_mode { "stream" } else { "single image" }
    );

    let scheduler = build_scheduler(&configuration)?;
    scheduler.start()?;

    tokio::select! {
        _ = run_camera(&scheduler, configuration.scheduler.target_fps) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown requested");
        }
    }

    scheduler.stop();
    scheduler.processor().with_processor(|processor| processor.stop());

    let stats = scheduler.stats();
    tracing::info!(
        "Frames submitted: {}, processed: {}, failed: {}, dropped: {}, skipped: {}",
        stats.frames_submitted,
        stats.frames_processed,
        stats.frames_failed,
        stats.frames_dropped,
        stats.frames_skipped
    );
    Ok(())
}
