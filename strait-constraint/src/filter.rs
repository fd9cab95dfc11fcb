use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use strait_parse::{ParseFailure, TokenGroup};

use crate::factory::ConstraintFactory;
use crate::SyntaxConstraint;

/// Index of a token in the fixed vocabulary.
pub type TokenId = usize;

/// A vocabulary pre-partitioned by one token group. Computed once at
/// filter construction; immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct VocabSplit {
	pub filtered: Vec<TokenId>,
	pub remaining: Vec<TokenId>,
}

impl VocabSplit {
	fn new(vocab: &[String], group: TokenGroup) -> VocabSplit {
		let mut split = VocabSplit::default();
		for (id, token) in vocab.iter().enumerate() {
			if group.contains(token) {
				split.filtered.push(id);
			} else {
				split.remaining.push(id);
			}
		}
		split
	}
}

struct InflightCheck {
	check_idx: usize,
	suppressed: Vec<TokenId>,
	rx: flume::Receiver<(usize, TokenId)>,
}

/// Streams the vocabulary ids that are invalid continuations of the
/// current constraint state.
///
/// A check starts from the constraint's token-group hints: the invalid
/// group is emitted wholesale, the valid group is skipped wholesale, and
/// every other token is verified by `would_accept` on worker threads, each
/// holding its own constraint snapshot. Results stream through a channel,
/// so the caller can start suppressing logits before the check finishes.
pub struct TokenFilter {
	vocab: Arc<Vec<String>>,
	splits: HashMap<TokenGroup, VocabSplit>,
	factory: ConstraintFactory,
	constraint: SyntaxConstraint,
	num_workers: usize,
	auto_check: bool,
	check_idx: usize,
	inflight: Option<InflightCheck>,
	active_cancel: Option<Arc<AtomicBool>>,
}

impl TokenFilter {
	pub fn new(vocab: Vec<String>, factory: ConstraintFactory, num_workers: usize, begin_first_check: bool) -> TokenFilter {
		let splits = TokenGroup::ALL_GROUPS.iter().map(|&group| (group, VocabSplit::new(&vocab, group))).collect();
		let constraint = factory.build();
		let mut filter = TokenFilter {
			vocab: Arc::new(vocab),
			splits,
			factory,
			constraint,
			num_workers: num_workers.max(1),
			auto_check: begin_first_check,
			check_idx: 0,
			inflight: None,
			active_cancel: None,
		};
		if begin_first_check {
			filter.begin_check();
		}
		filter
	}

	/// The constraint currently steering this filter.
	pub fn constraint(&self) -> &SyntaxConstraint {
		&self.constraint
	}

	pub fn vocab(&self) -> &[String] {
		&self.vocab
	}

	/// Discard the poisoned constraint and start over from the factory.
	pub fn reset(&mut self) {
		self.cancel_current_check();
		self.constraint = self.factory.build();
		self.check_idx = 0;
		if self.auto_check {
			self.begin_check();
		}
	}

	/// Arm a verification pass for the current constraint state.
	fn begin_check(&mut self) {
		self.cancel_current_check();

		let vocab_len = self.vocab.len();
		let mut to_check = vec![true; vocab_len];
		let mut suppressed = Vec::new();
		if let Some(split) = self.splits.get(&self.constraint.invalid_token_group()) {
			for &id in &split.filtered {
				suppressed.push(id);
				to_check[id] = false;
			}
		}
		if let Some(split) = self.splits.get(&self.constraint.valid_token_group()) {
			for &id in &split.filtered {
				to_check[id] = false;
			}
		}
		let unresolved: Vec<TokenId> = (0..vocab_len).filter(|&id| to_check[id]).collect();
		debug!("check {}: {} suppressed by group, {} to verify", self.check_idx, suppressed.len(), unresolved.len());

		let cancel = Arc::new(AtomicBool::new(false));
		let (tx, rx) = flume::unbounded();
		let batch_size = (unresolved.len() / self.num_workers).max(1);
		for batch in unresolved.chunks(batch_size) {
			let batch = batch.to_vec();
			let constraint = self.constraint.clone();
			let vocab = Arc::clone(&self.vocab);
			let cancel = Arc::clone(&cancel);
			let tx = tx.clone();
			let check_idx = self.check_idx;
			thread::spawn(move || {
				for id in batch {
					if cancel.load(Ordering::SeqCst) {
						return;
					}
					if !constraint.would_accept(&vocab[id]) && tx.send((check_idx, id)).is_err() {
						// receiver went away; no one wants the rest
						return;
					}
				}
			});
		}
		self.inflight = Some(InflightCheck {
			check_idx: self.check_idx,
			suppressed,
			rx,
		});
		self.active_cancel = Some(cancel);
	}

	/// Lazily yields `(check_idx, token_id)` for every invalid next token.
	/// Begins a check on demand when none is armed.
	pub fn invalid_next_tokens(&mut self) -> InvalidTokens {
		let check = match self.inflight.take() {
			Some(check) => check,
			None => {
				self.begin_check();
				self.inflight.take().expect("begin_check arms a check")
			}
		};
		InvalidTokens {
			check_idx: check.check_idx,
			suppressed: check.suppressed.into_iter(),
			rx: check.rx,
		}
	}

	/// Abandon any in-flight verification pass. Workers notice the guard
	/// flag and stop; partially delivered results are discarded.
	pub fn cancel_current_check(&mut self) {
		if let Some(cancel) = self.active_cancel.take() {
			cancel.store(true, Ordering::SeqCst);
			trace!("cancelled in-flight validity check");
		}
		self.inflight = None;
	}

	/// Advance the constraint with the sampled token and, when auto-check
	/// is on, immediately arm the next verification pass. Single-beam: only
	/// the first id is consumed.
	pub fn update(&mut self, token_ids: &[TokenId]) -> Result<(), ParseFailure> {
		self.cancel_current_check();
		let Some(&token_id) = token_ids.first() else {
			return Ok(());
		};
		let token = self
			.vocab
			.get(token_id)
			.cloned()
			.ok_or_else(|| ParseFailure::new(format!("token id {token_id} outside vocabulary")))?;
		debug!("update with token {token_id}: {token:?}");
		self.constraint.advance(&token)?;
		self.check_idx += 1;
		if self.auto_check {
			self.begin_check();
		}
		Ok(())
	}
}

/// Iterator over invalid `(check_idx, token_id)` pairs: group-suppressed
/// ids first, then worker verdicts as they arrive. Order within one check
/// is unspecified; consume the results as a set.
pub struct InvalidTokens {
	check_idx: usize,
	suppressed: std::vec::IntoIter<TokenId>,
	rx: flume::Receiver<(usize, TokenId)>,
}

impl Iterator for InvalidTokens {
	type Item = (usize, TokenId);

	fn next(&mut self) -> Option<(usize, TokenId)> {
		if let Some(id) = self.suppressed.next() {
			return Some((self.check_idx, id));
		}
		self.rx.recv().ok()
	}
}
