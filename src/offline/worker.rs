//! Background thread running one offline job at a time.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::error::VocalError;
use crate::offline::processor::{OfflineOutcome, OfflineVoiceProcessor};

/// Owns an [`OfflineVoiceProcessor`] and lends it to a worker thread for
/// each job. The processor comes back through the join handle, so nothing
/// is shared between the job and the caller while it runs.
#[derive(Debug)]
pub struct OfflineWorker {
    idle: Option<OfflineVoiceProcessor>,
    running: Option<JoinHandle<Option<OfflineVoiceProcessor>>>,
    jobs_started: u64,
    stack_size: Option<usize>,
}

impl OfflineWorker {
    pub fn new(processor: OfflineVoiceProcessor) -> Self {
        Self {
            idle: Some(processor),
            running: None,
            jobs_started: 0,
            stack_size: None,
        }
    }

    /// Stack size for job threads (default: the platform's).
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// True while a job is still running.
    pub fn is_busy(&self) -> bool {
        self.running.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Jobs started since construction.
    pub fn jobs_started(&self) -> u64 {
        self.jobs_started
    }

    /// Starts converting `input`, first waiting for any job in flight.
    /// `on_complete` runs on the worker thread with the outcome.
    ///
    /// If the thread cannot be spawned the error is returned and the
    /// processor stays with the worker.
    pub fn submit<F>(&mut self, input: Vec<f32>, on_complete: F) -> Result<(), VocalError>
    where
        F: FnOnce(OfflineOutcome) + Send + 'static,
    {
        self.wait()?;
        if self.idle.is_none() {
            return Err(lost_processor());
        }

        let job = self.jobs_started + 1;
        let (handoff, receive) = mpsc::sync_channel::<OfflineVoiceProcessor>(1);
        let mut builder = thread::Builder::new().name(format!("vocalshift-offline-{}", job));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let samples = input.len();
        let handle = builder
            .spawn(move || {
                let mut processor = receive.recv().ok()?;
                let outcome = processor.process(&input);
                log::info!("offline job {} finished: {}", job, outcome.status.message());
                on_complete(outcome);
                Some(processor)
            })
            .map_err(|e| {
                log::warn!("offline job {} could not start: {}", job, e);
                VocalError::from(e)
            })?;

        let processor = self.idle.take().ok_or_else(lost_processor)?;
        if let Err(mpsc::SendError(processor)) = handoff.send(processor) {
            self.idle = Some(processor);
            let _ = handle.join();
            return Err(VocalError::CollaboratorUnavailable(
                "offline job exited before receiving the processor".to_string(),
            ));
        }

        self.jobs_started = job;
        self.running = Some(handle);
        log::info!("offline job {} started: {} samples", job, samples);
        Ok(())
    }

    /// Blocks until the current job (if any) has finished.
    pub fn wait(&mut self) -> Result<(), VocalError> {
        if let Some(handle) = self.running.take() {
            let processor = handle.join().map_err(|_| {
                VocalError::CollaboratorUnavailable("offline job panicked".to_string())
            })?;
            self.idle = Some(processor.ok_or_else(lost_processor)?);
        }
        Ok(())
    }

    /// The processor, once idle. Waits for a running job.
    pub fn processor_mut(&mut self) -> Result<&mut OfflineVoiceProcessor, VocalError> {
        self.wait()?;
        self.idle.as_mut().ok_or_else(lost_processor)
    }
}

fn lost_processor() -> VocalError {
    VocalError::CollaboratorUnavailable("offline processor was lost".to_string())
}

impl Drop for OfflineWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.running.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::collaborator::{Conversion, ConversionRequest, NoModel, VoiceConverter};
    use crate::offline::processor::OfflineStatus;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Slow;

    impl VoiceConverter for Slow {
        fn is_loaded(&self) -> bool {
            true
        }

        fn convert(&mut self, request: &ConversionRequest<'_>) -> Conversion {
            thread::sleep(Duration::from_millis(50));
            Conversion::Waveform(vec![request.ai_blend; request.input_len])
        }
    }

    #[test]
    fn test_completion_is_delivered() {
        let mut worker =
            OfflineWorker::new(OfflineVoiceProcessor::new(44100, Box::new(NoModel)));
        let (tx, rx) = mpsc::channel();
        let input = vec![0.1f32; 3000];
        worker
            .submit(input.clone(), move |outcome| tx.send(outcome).unwrap())
            .unwrap();
        let outcome = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.status, OfflineStatus::NoModel);
        assert_eq!(outcome.audio, input);
        worker.wait().unwrap();
        assert!(!worker.is_busy());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_failed_spawn_keeps_processor() {
        // No address space can hold a 1 PiB stack.
        let mut worker = OfflineWorker::new(OfflineVoiceProcessor::new(44100, Box::new(Slow)))
            .with_stack_size(1 << 50);
        let err = worker.submit(vec![0.1; 4096], |_| {}).unwrap_err();
        assert!(matches!(err, VocalError::IoError(_)), "{:?}", err);
        assert_eq!(worker.jobs_started(), 0);
        assert!(!worker.is_busy());
        assert!(worker.processor_mut().unwrap().is_loaded());

        let err = worker.submit(vec![0.1; 4096], |_| {}).unwrap_err();
        assert!(matches!(err, VocalError::IoError(_)), "{:?}", err);
        assert!(worker.processor_mut().is_ok());
    }

    #[test]
    fn test_jobs_run_one_at_a_time() {
        let mut processor = OfflineVoiceProcessor::new(44100, Box::new(Slow));
        processor.set_ai_blend(0.5);
        let mut worker = OfflineWorker::new(processor);
        let (tx, rx) = mpsc::channel();

        for id in 0..3u32 {
            let tx = tx.clone();
            worker
                .submit(vec![0.2f32; 4096], move |outcome| tx.send((id, outcome)).unwrap())
                .unwrap();
        }
        worker.wait().unwrap();
        drop(tx);

        let done: Vec<(u32, OfflineOutcome)> = rx.iter().collect();
        assert_eq!(done.len(), 3);
        assert_eq!(
            done.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        for (_, outcome) in &done {
            assert!(outcome.status.is_converted());
            assert_eq!(outcome.audio, vec![0.5; 4096]);
        }
        assert_eq!(worker.jobs_started(), 3);
        assert!(worker.processor_mut().unwrap().is_loaded());
    }
}
