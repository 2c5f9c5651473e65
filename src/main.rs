use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};

use pl_home_advantage::charts::{self, BarTone, ChartBar, ChartKind};
use pl_home_advantage::config::{AnalysisConfig, parse_path_arg};
use pl_home_advantage::report::{self, SummaryReport};

struct App {
    summary: SummaryReport,
    chart: ChartKind,
    should_quit: bool,
}

impl App {
    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.chart = self.chart.next(),
            KeyCode::Char('1') => self.chart = ChartKind::Outcomes,
            KeyCode::Char('2') => self.chart = ChartKind::Teams,
            _ => {}
        }
    }
}

fn summary_path(args: &[String]) -> PathBuf {
    parse_path_arg(args, "--summary").unwrap_or_else(|| AnalysisConfig::from_args(args).summary_path())
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = summary_path(&args);
    let summary = report::read_summary(&path)
        .with_context(|| format!("run the analysis first; no summary at {}", path.display()))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App {
        summary,
        chart: ChartKind::Outcomes,
        should_quit: false,
    };
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;
        if event::poll(tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(charts::chart_title(app.chart, &app.summary))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let bars = match app.chart {
        ChartKind::Outcomes => charts::outcome_bars(&app.summary),
        ChartKind::Teams => charts::team_bars(&app.summary),
    };
    if bars.is_empty() {
        let empty = Paragraph::new("No qualifying teams in this dataset.")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, chunks[1]);
    } else {
        frame.render_widget(bar_chart(&bars, app.chart), chunks[1]);
    }

    let footer = format!(
        "{}  |  Tab switch chart  1/2 jump  q quit",
        charts::headline(&app.summary)
    );
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn tone_style(tone: BarTone) -> Style {
    match tone {
        BarTone::Gain => Style::default().fg(Color::Green),
        BarTone::Loss => Style::default().fg(Color::Red),
        BarTone::Neutral => Style::default().fg(Color::Gray),
    }
}

fn bar_chart(bars: &[ChartBar], kind: ChartKind) -> BarChart<'static> {
    let data: Vec<Bar<'static>> = bars
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.magnitude())
                .label(Line::from(b.label.clone()))
                .text_value(b.text.clone())
                .style(tone_style(b.tone))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL))
        .data(BarGroup::default().bars(&data));
    match kind {
        ChartKind::Outcomes => chart.bar_width(12).bar_gap(4).max(10_000),
        ChartKind::Teams => chart.direction(Direction::Horizontal).bar_width(1).bar_gap(1),
    }
}
