use anyhow::Result;
use brasil_dashboard::entities::bank::BankCategory;
use brasil_dashboard::entities::rate::{split_main_indicators, Level};
use brasil_dashboard::error::Resource;
use brasil_dashboard::{
    export, filter, money, Address, Bank, FilterCriteria, IndicatorCard, LoadTracker, Rate,
    RegistryNumber, SortField,
};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Banks,
    Rates,
    History,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Banks => Page::Rates,
            Page::Rates => Page::History,
            Page::History => Page::Banks,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Banks => Page::History,
            Page::Rates => Page::Banks,
            Page::History => Page::Rates,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Banks => "Bancos",
            Page::Rates => "Taxas",
            Page::History => "Histórico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub struct App {
    pub banks: Vec<Bank>,
    pub filtered_banks: Vec<Bank>,
    pub bank_state: TableState,
    pub criteria: FilterCriteria,
    pub main_only: bool,

    pub indicator_cards: Vec<IndicatorCard>,
    pub other_rates: Vec<Rate>,
    pub rates: Vec<Rate>,
    pub rate_state: TableState,

    pub cep_history: Vec<Address>,
    pub cnpj_history: Vec<RegistryNumber>,

    pub loading: LoadTracker,
    pub current_page: Page,
    pub input_mode: InputMode,
    pub show_detail: bool,
    pub message: Option<String>,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(
        banks: Vec<Bank>,
        rates: Vec<Rate>,
        cep_history: Vec<Address>,
        cnpj_history: Vec<RegistryNumber>,
        loading: LoadTracker,
        export_dir: PathBuf,
    ) -> Self {
        let (indicator_cards, other_rates) = split_main_indicators(&rates);

        let mut rate_state = TableState::default();
        if !other_rates.is_empty() {
            rate_state.select(Some(0));
        }

        let mut app = Self {
            banks,
            filtered_banks: Vec::new(),
            bank_state: TableState::default(),
            criteria: FilterCriteria::default(),
            main_only: false,
            indicator_cards,
            other_rates,
            rates,
            rate_state,
            cep_history,
            cnpj_history,
            loading,
            current_page: Page::Banks,
            input_mode: InputMode::Normal,
            show_detail: false,
            message: None,
            export_dir,
        };
        app.apply_filter();
        app
    }

    /// Recompute the visible bank list from the criteria
    pub fn apply_filter(&mut self) {
        let source = if self.main_only {
            brasil_dashboard::entities::bank::main_banks(&self.banks)
        } else {
            self.banks.clone()
        };
        self.filtered_banks = filter::filter_records(&source, Some(&self.criteria));

        // Reset selection to first item
        if !self.filtered_banks.is_empty() {
            self.bank_state.select(Some(0));
        } else {
            self.bank_state.select(None);
        }
    }

    pub fn push_search_char(&mut self, c: char) {
        self.criteria.search_term.push(c);
        self.apply_filter();
    }

    pub fn pop_search_char(&mut self) {
        self.criteria.search_term.pop();
        self.apply_filter();
    }

    pub fn clear_search(&mut self) {
        self.criteria = FilterCriteria::default();
        self.main_only = false;
        self.apply_filter();
    }

    pub fn cycle_sort_field(&mut self) {
        let field = self.criteria.sort_field.unwrap_or(SortField::Code);
        self.criteria.sort_field = Some(field.next());
        self.apply_filter();
    }

    pub fn toggle_sort_order(&mut self) {
        self.criteria.sort_order = self.criteria.sort_order.toggle();
        self.apply_filter();
    }

    pub fn toggle_main_only(&mut self) {
        self.main_only = !self.main_only;
        self.apply_filter();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn selected_bank(&self) -> Option<&Bank> {
        self.bank_state.selected().and_then(|i| self.filtered_banks.get(i))
    }

    fn active_list(&mut self) -> Option<(usize, &mut TableState)> {
        match self.current_page {
            Page::Banks => Some((self.filtered_banks.len(), &mut self.bank_state)),
            Page::Rates => Some((self.other_rates.len(), &mut self.rate_state)),
            Page::History => None,
        }
    }

    pub fn next(&mut self) {
        if let Some((len, state)) = self.active_list() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(i) if i >= len - 1 => 0,
                Some(i) => i + 1,
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        if let Some((len, state)) = self.active_list() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(0) => len - 1,
                Some(i) => i - 1,
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn page_down(&mut self) {
        if let Some((len, state)) = self.active_list() {
            if len == 0 {
                return;
            }
            let i = state.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
            state.select(Some(i));
        }
    }

    pub fn page_up(&mut self) {
        if let Some((_, state)) = self.active_list() {
            let i = state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
            state.select(Some(i));
        }
    }

    /// Write the current page's listing as CSV into the export directory
    pub fn export_current(&mut self) -> Result<PathBuf> {
        let today = Utc::now().date_naive();
        match self.current_page {
            Page::Rates => {
                let last = self.loading.state(Resource::Rates).last_updated;
                let csv = export::rates_to_csv(&self.rates, last)?;
                export::write_export(&self.export_dir, &export::rates_file_name(today), &csv)
            }
            _ => {
                let csv = export::banks_to_csv(&self.filtered_banks)?;
                export::write_export(&self.export_dir, &export::banks_file_name(today), &csv)
            }
        }
    }

    fn export_and_report(&mut self) {
        self.message = Some(match self.export_current() {
            Ok(path) => format!("Exportado: {}", path.display()),
            Err(e) => e.to_string(),
        });
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if app.input_mode == InputMode::Search {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => app.input_mode = InputMode::Normal,
                    KeyCode::Backspace => app.pop_search_char(),
                    KeyCode::Char(c) => app.push_search_char(c),
                    _ => {}
                }
                continue;
            }

            app.message = None;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('/') if app.current_page == Page::Banks => {
                    app.input_mode = InputMode::Search;
                }
                KeyCode::Char('s') if app.current_page == Page::Banks => app.cycle_sort_field(),
                KeyCode::Char('o') if app.current_page == Page::Banks => app.toggle_sort_order(),
                KeyCode::Char('m') if app.current_page == Page::Banks => app.toggle_main_only(),
                KeyCode::Char('c') => app.clear_search(),
                KeyCode::Char('e') => app.export_and_report(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => {
                    if let Some((len, state)) = app.active_list() {
                        if len > 0 {
                            state.select(Some(0));
                        }
                    }
                }
                KeyCode::End => {
                    if let Some((len, state)) = app.active_list() {
                        if len > 0 {
                            state.select(Some(len - 1));
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Banks if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_banks(f, content_chunks[0], app);
            render_bank_detail(f, content_chunks[1], app);
        }
        Page::Banks => render_banks(f, chunks[1], app),
        Page::Rates => render_rates(f, chunks[1], app),
        Page::History => render_history(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Banks, Page::Rates, Page::History];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Bancos: {}/{}", app.filtered_banks.len(), app.banks.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Taxas: {}", app.rates.len()),
        Style::default().fg(Color::White),
    ));

    if let Some(last) = app.loading.state(Resource::Rates).last_updated {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            money::last_update_text(last, Utc::now()),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn load_error_paragraph(app: &App, resource: Resource, title: &str) -> Option<Paragraph<'static>> {
    let state = app.loading.state(resource);
    let error = state.error?;
    Some(
        Paragraph::new(vec![
            Line::from(Span::styled(error, Style::default().fg(Color::Red))),
            Line::from(format!("Tentativas com falha: {}", state.retry_count)),
        ])
        .block(Block::default().borders(Borders::ALL).title(title.to_string())),
    )
}

fn render_banks(f: &mut Frame, area: Rect, app: &mut App) {
    if let Some(error) = load_error_paragraph(app, Resource::Banks, " Bancos ") {
        f.render_widget(error, area);
        return;
    }

    let header_cells = ["Código", "Nome", "Nome Completo", "ISPB", "Tipo"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_banks.iter().map(|bank| {
        let color = if bank.is_main() {
            Color::Green
        } else {
            Color::White
        };
        let marker = if bank.is_main() { "★ " } else { "  " };

        Row::new(vec![
            Cell::from(format!("{}{}", marker, bank.code_label())).style(Style::default().fg(color)),
            Cell::from(truncate(&bank.name, 28)),
            Cell::from(truncate(&bank.full_name, 40)),
            Cell::from(bank.ispb.clone()),
            Cell::from(bank.category().as_str()),
        ])
        .height(1)
    });

    let order = match app.criteria.sort_field {
        Some(field) => format!("{} {}", field.as_str(), app.criteria.sort_order.as_str()),
        None => "-".to_string(),
    };
    let title = format!(
        " Bancos | busca: \"{}\" | ordem: {}{} ",
        app.criteria.search_term,
        order,
        if app.main_only { " | principais" } else { "" }
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(30),
            Constraint::Length(42),
            Constraint::Length(10),
            Constraint::Length(26),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.bank_state);
}

fn render_bank_detail(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Yellow);

    let lines = match app.selected_bank() {
        Some(bank) => vec![
            Line::from(vec![Span::styled("Nome: ", label), Span::raw(bank.name.clone())]),
            Line::from(vec![
                Span::styled("Nome completo: ", label),
                Span::raw(bank.full_name.clone()),
            ]),
            Line::from(vec![Span::styled("Código: ", label), Span::raw(bank.code_label())]),
            Line::from(vec![Span::styled("ISPB: ", label), Span::raw(bank.ispb.clone())]),
            Line::from(vec![
                Span::styled("Tipo: ", label),
                Span::raw(bank.category().as_str()),
            ]),
            Line::from(vec![
                Span::styled("Principal: ", label),
                Span::raw(if bank.is_main() { "sim" } else { "não" }),
            ]),
        ],
        None => vec![Line::from("Nenhum banco selecionado")],
    };

    let detail = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detalhes "),
    );

    f.render_widget(detail, area);
}

fn category_color(category: BankCategory) -> Color {
    match category {
        BankCategory::CreditCooperative => Color::Green,
        BankCategory::FinanceCompany => Color::Magenta,
        BankCategory::InvestmentBank => Color::Blue,
        BankCategory::DevelopmentBank => Color::Cyan,
        BankCategory::CommercialBank => Color::White,
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::High => Color::Red,
        Level::Moderate => Color::Yellow,
        Level::Low => Color::Green,
    }
}

fn render_rates(f: &mut Frame, area: Rect, app: &mut App) {
    if let Some(error) = load_error_paragraph(app, Resource::Rates, " Taxas ") {
        f.render_widget(error, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let card_lines: Vec<Line> = if app.indicator_cards.is_empty() {
        vec![Line::from("Nenhum indicador principal encontrado")]
    } else {
        app.indicator_cards
            .iter()
            .map(|card| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<5}", card.display_name),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {:>14}  ", card.formatted_value())),
                    Span::styled(card.description.clone(), Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect()
    };

    let cards = Paragraph::new(card_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Indicadores principais "),
    );
    f.render_widget(cards, chunks[0]);

    let header = Row::new(
        ["Nome", "Valor", "Unidade", ""]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
    )
    .style(Style::default().bg(Color::DarkGray));

    let rows = app.other_rates.iter().map(|rate| {
        Row::new(vec![
            Cell::from(truncate(&rate.name, 30)),
            Cell::from(money::format_by_magnitude(rate.value))
                .style(Style::default().fg(level_color(rate.level()))),
            Cell::from(rate.unit()),
            Cell::from(rate.trend().arrow()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(2),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Outras taxas "))
    .highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.rate_state);
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut cep_lines: Vec<Line> = app
        .cep_history
        .iter()
        .map(|address| Line::from(address.one_line()))
        .collect();
    if cep_lines.is_empty() {
        cep_lines.push(Line::from("Nenhuma consulta"));
    }

    let mut cnpj_lines: Vec<Line> = app
        .cnpj_history
        .iter()
        .map(|number| Line::from(number.to_string()))
        .collect();
    if cnpj_lines.is_empty() {
        cnpj_lines.push(Line::from("Nenhuma consulta"));
    }

    f.render_widget(
        Paragraph::new(cep_lines).block(Block::default().borders(Borders::ALL).title(" CEP ")),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(cnpj_lines).block(Block::default().borders(Borders::ALL).title(" CNPJ ")),
        chunks[1],
    );
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if app.input_mode == InputMode::Search {
        status_spans.push(Span::styled(
            format!(" Busca: {}▏", app.criteria.search_term),
            Style::default().fg(Color::Yellow),
        ));
        status_spans.push(Span::raw(" | Enter/Esc concluir"));
    } else if let Some(message) = &app.message {
        status_spans.push(Span::styled(
            format!(" {}", message),
            Style::default().fg(Color::Green),
        ));
    } else {
        if let Some(bank) = app.selected_bank().filter(|_| app.current_page == Page::Banks) {
            status_spans.push(Span::styled(
                format!(" {} ", bank.category().as_str()),
                Style::default().fg(category_color(bank.category())),
            ));
            status_spans.push(Span::raw("| "));
        }

        for (key, action) in [
            ("/", "Busca"),
            ("s", "Campo"),
            ("o", "Ordem"),
            ("m", "Principais"),
            ("c", "Limpar"),
            ("e", "Exportar"),
            ("Tab", "Página"),
        ] {
            status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(format!(" {} | ", action)));
        }
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Sair"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
