//! The cooperative loop shared by terminal front ends

use std::io;
use std::time::{Duration, Instant};

use super::{Controller, Flow, Input};
use crate::sources::HostSources;

/// Where input comes from. `Ok(None)` means the timeout elapsed.
pub trait EventSource {
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Input>>;
}

/// Drive `controller` until an input asks to exit.
///
/// Each turn runs pending refreshes, renders, runs a queued command (the
/// frame showing it as running is already on screen), then waits for input
/// no longer than the next refresh is due. Input already queued is handled as
/// one batch before the next refresh, so repeated requests coalesce.
pub fn run_loop<S, E, R>(controller: &mut Controller<S>, events: &mut E, mut render: R) -> io::Result<()>
where
    S: HostSources,
    E: EventSource,
    R: FnMut(&mut Controller<S>) -> io::Result<()>,
{
    loop {
        controller.run_pending();
        render(controller)?;

        if controller.has_queued_command() {
            controller.run_queued_command();
            continue;
        }

        let wait = controller.next_refresh_in(Instant::now());
        let Some(first) = events.poll(wait)? else {
            controller.tick(Instant::now());
            continue;
        };

        let mut next = Some(first);
        while let Some(input) = next {
            if controller.handle_input(input) == Flow::Exit {
                return Ok(());
            }
            next = events.poll(Duration::ZERO)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use super::*;
    use crate::browser::BrowserState;
    use crate::controller::testing::FakeHost;
    use crate::controller::{ControllerOptions, ViewState};

    /// Hands out inputs in batches; a zero-timeout poll ends the batch.
    struct Scripted {
        batches: VecDeque<VecDeque<Input>>,
        polls: usize,
    }

    impl Scripted {
        fn new(batches: Vec<Vec<Input>>) -> Self {
            Self {
                batches: batches.into_iter().map(VecDeque::from).collect(),
                polls: 0,
            }
        }
    }

    impl EventSource for Scripted {
        fn poll(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
            self.polls += 1;
            loop {
                match self.batches.front_mut() {
                    // Out of script: behave like Ctrl-C so a bad test cannot hang
                    None => return Ok(Some(Input::Interrupt)),
                    Some(batch) => {
                        if let Some(input) = batch.pop_front() {
                            return Ok(Some(input));
                        }
                    }
                }
                self.batches.pop_front();
                if timeout.is_zero() {
                    return Ok(None);
                }
            }
        }
    }

    fn controller() -> Controller<FakeHost> {
        Controller::new(
            FakeHost::default(),
            BrowserState::for_tests(PathBuf::from("/")),
            ControllerOptions::default(),
        )
    }

    #[test]
    fn test_scripted_session() {
        let mut controller = controller();
        let mut events = Scripted::new(vec![
            vec![Input::Char('p')],
            vec![Input::Char('r'), Input::Char('r')],
            vec![Input::Char('q')],
        ]);
        let mut views = Vec::new();

        run_loop(&mut controller, &mut events, |c| {
            views.push(c.view());
            Ok(())
        })
        .expect("loop ends cleanly");

        // One fetch on entering Processes, one for the coalesced pair
        assert_eq!(controller.sources().list_top_calls, vec![15, 15]);
        assert_eq!(controller.dropped_refreshes(), 1);
        assert_eq!(controller.sources().sample_calls, 1);
        assert_eq!(
            views,
            vec![ViewState::Dashboard, ViewState::Processes, ViewState::Processes]
        );
    }

    #[test]
    fn test_refresh_presses_in_separate_polls_coalesce() {
        let mut controller = controller();
        let mut events = Scripted::new(vec![
            vec![Input::Char('p')],
            vec![Input::Char('r')],
            vec![Input::Char('r')],
            vec![Input::Char('q')],
        ]);

        run_loop(&mut controller, &mut events, |_| Ok(())).expect("loop ends cleanly");

        // Entry fetch plus the first 'r'; the second lands inside the cadence
        assert_eq!(controller.sources().list_top_calls, vec![15, 15]);
        assert_eq!(controller.dropped_refreshes(), 1);
    }

    #[test]
    fn test_queued_command_runs_after_render() {
        let mut controller = controller();
        let mut script = vec![Input::Char('t')];
        script.extend("ls".chars().map(Input::Char));
        script.push(Input::Enter);
        let mut events = Scripted::new(vec![script, vec![Input::Interrupt]]);
        let mut frames = Vec::new();

        run_loop(&mut controller, &mut events, |c| {
            frames.push((
                c.terminal().queued().map(str::to_string),
                c.terminal().last_result().is_some(),
            ));
            Ok(())
        })
        .expect("loop ends cleanly");

        assert_eq!(
            frames,
            vec![
                (None, false),
                (Some("ls".to_string()), false),
                (None, true),
            ]
        );
        assert_eq!(controller.sources().commands, vec!["ls".to_string()]);
    }

    #[test]
    fn test_render_error_stops_the_loop() {
        let mut controller = controller();
        let mut events = Scripted::new(Vec::new());
        let err = run_loop(&mut controller, &mut events, |_| {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(events.polls, 0);
    }
}
