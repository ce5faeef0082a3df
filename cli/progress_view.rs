use colored::Colorize;
use emerge_mining::TrainProgress;
use num_traits::ToPrimitive;
use std::{
	io::Write,
	sync::mpsc::{channel, Receiver, Sender, TryRecvError},
	thread::{sleep, spawn, JoinHandle},
	time::Duration,
};

const BAR_WIDTH: usize = 40;

/// A `ProgressView` draws the latest training progress on one line of stderr from a background thread.
pub struct ProgressView {
	thread: Option<JoinHandle<()>>,
	sender: Option<Sender<Option<TrainProgress>>>,
}

impl ProgressView {
	pub fn new() -> Self {
		let (sender, receiver) = channel::<Option<TrainProgress>>();
		let thread = Some(spawn(move || thread_main(receiver)));
		Self {
			thread,
			sender: Some(sender),
		}
	}

	pub fn update(&mut self, progress: TrainProgress) {
		if let Some(sender) = self.sender.as_ref() {
			sender.send(Some(progress)).ok();
		}
	}
}

impl Drop for ProgressView {
	fn drop(&mut self) {
		if let Some(sender) = self.sender.take() {
			sender.send(None).ok();
		}
		if let Some(thread) = self.thread.take() {
			thread.join().ok();
		}
	}
}

fn thread_main(receiver: Receiver<Option<TrainProgress>>) {
	let mut progress = None;
	loop {
		match receiver.try_recv() {
			Err(TryRecvError::Empty) => {}
			Err(TryRecvError::Disconnected) | Ok(None) => break,
			Ok(Some(new_progress)) => {
				// Finish the line of the previous stage.
				if let Some(progress) = progress.as_ref() {
					draw(progress);
					eprintln!();
				}
				progress = Some(new_progress);
			}
		};
		if let Some(progress) = progress.as_ref() {
			draw(progress);
		}
		sleep(Duration::from_millis(15));
	}
	if let Some(progress) = progress.as_ref() {
		draw(progress);
		eprintln!();
	}
}

fn draw(progress: &TrainProgress) {
	let (title, counter, unit) = match progress {
		TrainProgress::ComputingProbabilities(counter) => {
			("Computing item probabilities", counter, "items")
		}
		TrainProgress::Mining(counter) => ("Mining patterns", counter, "classes"),
		TrainProgress::Pruning(counter) => ("Pruning patterns", counter, "classes"),
	};
	let filled = (counter.fraction() * BAR_WIDTH.to_f64().unwrap())
		.round()
		.to_usize()
		.unwrap_or(0)
		.min(BAR_WIDTH);
	let bar = format!("{}{}", "█".repeat(filled), " ".repeat(BAR_WIDTH - filled));
	eprint!(
		"\r{} |{}| {} / {} {}",
		title.blue().bold(),
		bar,
		counter.get().min(counter.total()),
		counter.total(),
		unit
	);
	std::io::stderr().flush().ok();
}
