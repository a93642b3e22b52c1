use super::Application;

/// Hooks an application implements to be driven by [`Application::run`].
///
/// Only [`on_tick`](Self::on_tick) is required. Resources are expected to be
/// created in [`on_init`](Self::on_init) and released in
/// [`on_shutdown`](Self::on_shutdown); note that a host-driven loop never
/// reaches `on_shutdown`.
pub trait Lifecycle {
    /// Called once, before the first tick.
    fn on_init(&mut self, _app: &mut Application) {}

    /// Called once per frame with the seconds elapsed since the previous
    /// frame. Should end with [`Application::end_frame`].
    fn on_tick(&mut self, app: &mut Application, delta_time: f32);

    /// Called once after the blocking loop exits.
    fn on_shutdown(&mut self, _app: &mut Application) {}

    /// Checked before every blocking-loop iteration. Defaults to the window's
    /// close request (close button, Escape or
    /// [`Application::request_close`]).
    fn should_quit(&self, app: &Application) -> bool {
        app.close_requested()
    }
}

/// Where an [`Application`] is in its life.
///
/// A failed bootstrap has no state here: construction returns
/// [`InitError`](crate::InitError) and no application exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Window and context exist; `on_init` has not run.
    Uninitialized,
    /// Inside `on_init`.
    Initializing,
    /// Ticking.
    Running,
    /// Inside `on_shutdown`.
    ShuttingDown,
    /// `on_shutdown` has returned.
    Terminated,
}
