//! Runtime: event loop and input routing for the TUI.
//!
//! One `tokio::select!` loop multiplexes terminal input (forwarded from a
//! dedicated input task), completed fetches, the filter debounce deadline,
//! the animation tick and Ctrl-C. All state mutation happens on this loop;
//! fetches run as spawned tasks that only produce [`Msg`]s.
//!
//! After every draw the list state is asked for post-render effects, which is
//! where prefetching and viewport-driven loads originate.

use std::{rc::Rc, sync::Arc, time::Duration, time::Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use queuedeck_api::QueueSource;
use queuedeck_types::{Effect, Msg};
use rat_focus::FocusBuilder;
use ratatui::{Terminal, prelude::*};
use tokio::{
    signal,
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::cmd;
use crate::ui::components::component::Component;
use crate::ui::debounce::DebounceTimer;
use crate::ui::main_component::MainView;

type Backend = CrosstermBackend<std::io::Stdout>;

const FAST_TICK: Duration = Duration::from_millis(100);
const IDLE_TICK: Duration = Duration::from_millis(5000);

/// Spawn the input task that polls the terminal and forwards events over a
/// channel. Mouse moves are throttled to one per 16 ms.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);

    tokio::spawn(async move {
        let sixteen_ms = Duration::from_millis(16);
        let mut last_mouse_move = Instant::now();
        loop {
            match event::poll(sixteen_ms) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    warn!(%error, "failed to poll terminal events");
                    break;
                }
            }
            match event::read() {
                Ok(event) => {
                    let is_mouse_move = event.as_mouse_event().is_some_and(|mouse| mouse.kind == MouseEventKind::Moved);
                    if is_mouse_move {
                        if last_mouse_move.elapsed() < sixteen_ms {
                            continue;
                        }
                        last_mouse_move = Instant::now();
                    }
                    if sender.send(event).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to read terminal event");
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<Backend>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    // The focus tree changes shape when the detail modal opens or closes.
    let old_focus = std::mem::take(&mut app.focus);
    app.focus = Rc::new(FocusBuilder::rebuild_for(app, Some(Rc::unwrap_or_clone(old_focus))));
    if app.focus.focused().is_none() {
        main_view.restore_focus(app);
    }
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) => main_view.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => main_view.handle_mouse_events(app, mouse_event),
        Event::Resize(width, height) => main_view.handle_message(app, Msg::Resize(width, height)),
        Event::FocusGained | Event::FocusLost | Event::Paste(_) => Vec::new(),
    }
}

/// Applies effects until none remain, spawning network work. Returns `true`
/// when an effect asked to quit.
fn process_effects(
    app: &mut App,
    debounce: &mut DebounceTimer,
    source: &Arc<dyn QueueSource>,
    pending: &mut FuturesUnordered<JoinHandle<Msg>>,
    effects: Vec<Effect>,
) -> bool {
    let batch = cmd::from_effects(app, debounce, effects);
    if !batch.cmds.is_empty() {
        if !app.is_busy() {
            app.throbber_idx = 0;
        }
        pending.extend(cmd::spawn_cmds(source, batch.cmds));
    }
    batch.quit
}

/// Sets up the terminal, runs the event loop and restores the terminal.
/// Returns the query string of the filter that was committed last.
pub async fn run_app(mut app: App) -> Result<String> {
    let mut input_receiver = spawn_input_thread();
    let mut main_view = MainView::new();
    let mut terminal = setup_terminal()?;

    let source = Arc::clone(&app.ctx.source);
    let mut debounce = DebounceTimer::default();
    let mut pending: FuturesUnordered<JoinHandle<Msg>> = FuturesUnordered::new();

    let mut current_interval = IDLE_TICK;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mount = app.mount();
    let mut quit = process_effects(&mut app, &mut debounce, &source, &mut pending, mount);
    let mut last_size: Option<(u16, u16)> = crossterm::terminal::size().ok();
    info!(query = %app.share_query, "queuedeck started");

    while !quit {
        render(&mut terminal, &mut app, &mut main_view)?;
        let after_render = app.queue.after_render();
        if process_effects(&mut app, &mut debounce, &source, &mut pending, after_render) {
            break;
        }

        let target_interval = if app.is_busy() { FAST_TICK } else { IDLE_TICK };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let effects = tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                if let Event::Key(key_event) = event
                    && key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }
                handle_input_event(&mut app, &mut main_view, event)
            }

            Some(joined) = pending.next(), if !pending.is_empty() => {
                match joined {
                    Ok(msg) => main_view.handle_message(&mut app, msg),
                    Err(error) => {
                        warn!(%error, "request task failed");
                        Vec::new()
                    }
                }
            }

            () = debounce.fired(), if debounce.is_armed() => {
                debug!("filter debounce elapsed");
                main_view.handle_message(&mut app, Msg::FilterDebounceElapsed)
            }

            _ = ticker.tick() => main_view.handle_message(&mut app, Msg::Tick),

            _ = signal::ctrl_c() => break,
        };
        quit = process_effects(&mut app, &mut debounce, &source, &mut pending, effects);

        // Some terminals drop resize notifications.
        if let Ok(size) = crossterm::terminal::size()
            && last_size != Some(size)
        {
            last_size = Some(size);
            let _ = app.update(&Msg::Resize(size.0, size.1));
        }
    }

    for handle in pending.iter() {
        handle.abort();
    }
    cleanup_terminal(&mut terminal)?;
    info!(query = %app.share_query, "queuedeck stopped");
    Ok(app.share_query)
}
