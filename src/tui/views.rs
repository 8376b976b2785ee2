// Rendering for the configurator screen
//
// Pure functions of `App`: nothing here mutates state or talks to the
// backend. Layout comes from `layout::AppLayout`, colors from the theme.

use super::app::App;
use super::form::{AuthForm, Field};
use super::layout::{centered_rect, AppLayout, Breakpoint};
use super::overlay::{BuildEntry, Overlay};
use crate::catalog::{Category, Component, Notification, Offer};
use crate::logging::LogLevel;
use crate::util::{format_price, pad_to_width, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let layout = AppLayout::compute(f.area());

    render_title(f, app, layout.title);
    render_tabs(f, app, layout.tabs, layout.breakpoint);
    render_filters(f, app, layout.filters);
    render_list(f, app, layout.list, layout.breakpoint);
    render_summary(f, app, layout.summary);
    if layout.logs.height > 0 {
        render_logs(f, app, layout.logs);
    }
    render_status(f, app, layout.status);

    if let Some(overlay) = &app.overlay {
        render_overlay(f, app, overlay);
    }
    if let Some(toast) = &app.toast {
        toast.render(f, f.area(), &app.theme);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main screen
// ─────────────────────────────────────────────────────────────────────────────

fn render_title(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " uconf ",
            Style::default()
                .fg(app.theme.title)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("PC build configurator", Style::default().fg(app.theme.muted)),
    ];

    match app.account_label() {
        Some(account) => {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(account, Style::default().fg(app.theme.accent)));
            if let Some(unread) = app.unread.filter(|n| *n > 0) {
                spans.push(Span::styled(
                    format!("  ✉ {unread} new"),
                    Style::default()
                        .fg(app.theme.highlight)
                        .add_modifier(Modifier::BOLD),
                ));
            }
        }
        None => {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                "not logged in (l)",
                Style::default().fg(app.theme.muted),
            ));
        }
    }

    let title = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.title))
            .title_top(Line::from(" ? ").right_aligned()),
    );
    f.render_widget(title, area);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect, breakpoint: Breakpoint) {
    let selection = app.workflow.selection();
    let titles: Vec<Line> = Category::ALL
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let label = if breakpoint.at_least(Breakpoint::Wide) {
                category.label()
            } else {
                category.short_label()
            };
            let mark = if selection.get(*category).is_some() {
                "✓"
            } else {
                " "
            };
            let style = if selection.get(*category).is_some() {
                Style::default().fg(app.theme.success)
            } else {
                Style::default().fg(app.theme.foreground)
            };
            Line::from(Span::styled(format!("{}{} {}", mark, i + 1, label), style))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.workflow.category().index())
        .highlight_style(
            Style::default()
                .fg(app.theme.highlight)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("│", Style::default().fg(app.theme.border)))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(tabs, area);
}

fn render_filters(f: &mut Frame, app: &App, area: Rect) {
    let filters = app.workflow.filters();
    let label = Style::default().fg(app.theme.muted);
    let value = Style::default().fg(app.theme.foreground);
    let sep = Span::styled("  │  ", Style::default().fg(app.theme.border));

    let search = if app.search_mode {
        Span::styled(
            format!("{}▏", filters.search),
            Style::default().fg(app.theme.highlight),
        )
    } else if filters.search.is_empty() {
        Span::styled("—", label)
    } else {
        Span::styled(filters.search.clone(), value)
    };

    let line = Line::from(vec![
        Span::styled(" use case ", label),
        Span::styled(filters.usecase.label(), value),
        sep.clone(),
        Span::styled("brand ", label),
        Span::styled(filters.brand.to_string(), value),
        sep.clone(),
        Span::styled("sort ", label),
        Span::styled(filters.sort.label(), value),
        sep.clone(),
        Span::styled(app.workflow.mode().label(), value),
        sep,
        Span::styled("search ", label),
        search,
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_list(f: &mut Frame, app: &App, area: Rect, breakpoint: Breakpoint) {
    let category = app.workflow.category();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(format!(" {} ", category.label()));

    let visible = app.workflow.visible();

    // Placeholder states: loading, failed, empty
    let placeholder = if app.workflow.is_loading() && visible.is_empty() {
        Some(Line::styled(
            format!(" {} Loading…", app.spinner()),
            Style::default().fg(app.theme.muted),
        ))
    } else if let Some(error) = app.workflow.error() {
        let hint = if error.retryable { " (r to retry)" } else { "" };
        Some(Line::styled(
            format!(" {}{}", error.message, hint),
            Style::default().fg(app.theme.error),
        ))
    } else if visible.is_empty() {
        Some(Line::styled(
            " No components match.",
            Style::default().fg(app.theme.muted),
        ))
    } else {
        None
    };
    if let Some(line) = placeholder {
        f.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let price_width = 10;
    let marks_width = 4;
    let brand_width = if breakpoint.at_least(Breakpoint::Normal) { 10 } else { 0 };
    let rest = inner_width.saturating_sub(price_width + marks_width + brand_width);
    let (name_width, spec_width) = if breakpoint.at_least(Breakpoint::Wide) {
        (rest * 3 / 5, rest - rest * 3 / 5)
    } else {
        (rest, 0)
    };

    let selection = app.workflow.selection();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|c| {
            let chosen = selection.contains(c);
            let alert = app.subscriptions.is_subscribed(&c.id);
            let mut spans = vec![
                Span::styled(
                    if chosen { " ● " } else { "   " },
                    Style::default().fg(app.theme.success),
                ),
                Span::styled(
                    if alert { "◆" } else { " " },
                    Style::default().fg(app.theme.accent),
                ),
                Span::styled(
                    pad_to_width(&c.name, name_width),
                    if chosen {
                        Style::default()
                            .fg(app.theme.success)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(app.theme.foreground)
                    },
                ),
            ];
            if brand_width > 0 {
                spans.push(Span::styled(
                    pad_to_width(&c.brand, brand_width),
                    Style::default().fg(app.theme.muted),
                ));
            }
            if spec_width > 0 {
                spans.push(Span::styled(
                    pad_to_width(&c.spec_summary(), spec_width),
                    Style::default().fg(app.theme.muted),
                ));
            }
            spans.push(Span::styled(
                format!("{:>width$}", format_price(app.workflow.prices().get(&c.id)), width = price_width),
                Style::default().fg(app.theme.price),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title_right = if app.workflow.is_loading() {
        format!(" {} ", app.spinner())
    } else {
        format!(" {} ", visible.len())
    };
    let list = List::new(items)
        .block(block.title_top(Line::from(title_right).right_aligned()))
        .highlight_style(
            Style::default()
                .bg(app.theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default().with_selected(Some(app.cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let title = match &app.loaded_build {
        Some((_, name)) => format!(" Build: {} ", name),
        None => " Build ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let price_width = 10;
    let name_width = inner_width.saturating_sub(price_width + 6);
    let selection = app.workflow.selection();
    let prices = app.workflow.prices();

    let mut lines: Vec<Line> = Category::ALL
        .iter()
        .map(|category| {
            let label = Span::styled(
                format!(" {:<5}", category.short_label()),
                Style::default().fg(app.theme.muted),
            );
            match selection.get(*category) {
                Some(c) => Line::from(vec![
                    label,
                    Span::styled(
                        pad_to_width(&c.name, name_width),
                        Style::default().fg(app.theme.foreground),
                    ),
                    Span::styled(
                        format!("{:>width$}", format_price(prices.get(&c.id)), width = price_width),
                        Style::default().fg(app.theme.price),
                    ),
                ]),
                None => Line::from(vec![
                    label,
                    Span::styled("—", Style::default().fg(app.theme.border)),
                ]),
            }
        })
        .collect();

    lines.push(Line::raw(""));
    let total = match app.workflow.total() {
        _ if selection.is_empty() => Span::styled(
            "Pick parts with Enter",
            Style::default().fg(app.theme.muted),
        ),
        Some(total) => Span::styled(
            format_price(Some(total)),
            Style::default()
                .fg(app.theme.price)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("pricing…", Style::default().fg(app.theme.muted)),
    };
    lines.push(Line::from(vec![
        Span::styled(" Total ", Style::default().add_modifier(Modifier::BOLD)),
        total,
    ]));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_logs(f: &mut Frame, app: &App, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(14) as usize;
    let lines: Vec<Line> = app
        .log_buffer
        .recent(rows)
        .into_iter()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Error => app.theme.error,
                LogLevel::Warn => app.theme.warning,
                LogLevel::Info => app.theme.foreground,
                LogLevel::Debug | LogLevel::Trace => app.theme.muted,
            };
            Line::from(vec![
                Span::styled(
                    format!(" {} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(app.theme.muted),
                ),
                Span::styled(
                    truncate_to_width(&entry.message, width),
                    Style::default().fg(color),
                ),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(" Log ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let text = if app.search_mode {
        " type to search │ Enter: keep │ Esc: clear".to_string()
    } else {
        let account = if app.session.is_authenticated() {
            "n: notifications │ w: save │ L: log out"
        } else {
            "l: log in │ R: register"
        };
        format!(
            " ←/→: category │ ↑/↓: move │ Enter: pick │ o: offers │ a: alert │ B: builds │ {} │ ?: help │ q: quit",
            account
        )
    };

    let status = Paragraph::new(truncate_to_width(&text, area.width as usize))
        .style(Style::default().fg(app.theme.status_bar))
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(status, area);
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlays
// ─────────────────────────────────────────────────────────────────────────────

fn render_overlay(f: &mut Frame, app: &App, overlay: &Overlay) {
    let screen = f.area();
    let (width, height) = match overlay {
        Overlay::Help => (60, 30),
        Overlay::Auth(_) => (56, 13),
        Overlay::SaveBuild { .. } => (56, 9),
        _ => (screen.width.saturating_sub(10).min(100), screen.height.saturating_sub(6)),
    };
    let area = centered_rect(width, height, screen);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight))
        .title(overlay.title())
        .style(Style::default().bg(app.theme.background));

    let lines = match overlay {
        Overlay::Help => help_lines(app),
        Overlay::Auth(form) => auth_lines(app, form),
        Overlay::Details(component) => detail_lines(app, component),
        Overlay::Offers {
            component,
            offers,
            error,
            selected,
        } => offer_lines(app, component, offers.as_deref(), error.as_deref(), *selected),
        Overlay::Notifications {
            items,
            error,
            selected,
        } => notification_lines(app, items.as_deref(), error.as_deref(), *selected),
        Overlay::SaveBuild {
            name,
            update,
            error,
            saving,
        } => save_lines(app, name, update.is_some(), error.as_deref(), *saving),
        Overlay::Builds {
            entries,
            loading,
            selected,
        } => build_lines(app, entries, *loading, *selected),
    };

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn help_lines(app: &App) -> Vec<Line<'static>> {
    let key_style = Style::default().fg(app.theme.accent);
    let desc_style = Style::default().fg(app.theme.foreground);
    let header_style = Style::default()
        .fg(app.theme.highlight)
        .add_modifier(Modifier::BOLD);

    let kb = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{:<14}", key), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    vec![
        Line::styled("  Browse", header_style),
        kb("←/→ Tab", "previous / next category"),
        kb("1-9", "jump to category"),
        kb("↑/↓ j/k", "move in list"),
        kb("Enter Space", "pick / unpick component"),
        kb("x  X", "remove this slot / clear build"),
        kb("d", "component details"),
        Line::raw(""),
        Line::styled("  Filter", header_style),
        kb("u", "cycle use case"),
        kb("b", "cycle brand"),
        kb("s", "cycle price sort"),
        kb("c", "compatible only / all parts"),
        kb("/", "search by name"),
        kb("r", "retry a failed load"),
        Line::raw(""),
        Line::styled("  Account", header_style),
        kb("l  R  L", "log in / register / log out"),
        kb("o", "shop offers"),
        kb("a", "toggle price alert"),
        kb("n", "notifications"),
        kb("w", "save build"),
        kb("B", "load a curated or saved build"),
        Line::raw(""),
        kb("?  q", "help / quit"),
    ]
}

fn auth_lines(app: &App, form: &AuthForm) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw("")];
    for field in form.fields() {
        let focused = form.focus == *field;
        let raw = form.value(*field);
        let shown = if *field == Field::Password {
            "•".repeat(raw.chars().count())
        } else {
            raw.to_string()
        };
        let cursor = if focused { "▏" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<10}", field.label()),
                if focused {
                    Style::default()
                        .fg(app.theme.highlight)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(app.theme.muted)
                },
            ),
            Span::styled(
                format!("{shown}{cursor}"),
                Style::default().fg(app.theme.foreground),
            ),
        ]));
        lines.push(Line::raw(""));
    }

    if form.pending {
        lines.push(Line::styled(
            format!("  {} Contacting server…", app.spinner()),
            Style::default().fg(app.theme.muted),
        ));
    } else if let Some(message) = &form.message {
        lines.push(Line::styled(
            format!("  {message}"),
            Style::default().fg(app.theme.warning),
        ));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  Enter: submit │ Tab: next field │ Ctrl-R: switch │ Esc: cancel",
        Style::default().fg(app.theme.muted),
    ));
    lines
}

fn detail_lines(app: &App, component: &Component) -> Vec<Line<'static>> {
    let label = Style::default().fg(app.theme.muted);
    let value = Style::default().fg(app.theme.foreground);
    let alert = if app.subscriptions.is_subscribed(&component.id) {
        "on"
    } else {
        "off"
    };

    let mut lines = vec![
        Line::styled(
            format!("  {}", component.name),
            Style::default()
                .fg(app.theme.title)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  Category     ", label),
            Span::styled(component.category.label(), value),
        ]),
        Line::from(vec![
            Span::styled("  Brand        ", label),
            Span::styled(component.brand.clone(), value),
        ]),
        Line::from(vec![
            Span::styled("  Lowest price ", label),
            Span::styled(
                format_price(app.workflow.prices().get(&component.id)),
                Style::default().fg(app.theme.price),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Price alert  ", label),
            Span::styled(alert, value),
        ]),
        Line::raw(""),
        Line::styled("  Specifications", Style::default().add_modifier(Modifier::BOLD)),
    ];
    for (key, v) in &component.specs {
        lines.push(Line::from(vec![
            Span::styled(format!("    {:<16}", key), label),
            Span::styled(v.clone(), value),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  o: offers │ a: toggle alert │ Esc: close",
        label,
    ));
    lines
}

fn offer_lines(
    app: &App,
    component: &Component,
    offers: Option<&[Offer]>,
    error: Option<&str>,
    selected: usize,
) -> Vec<Line<'static>> {
    let muted = Style::default().fg(app.theme.muted);
    let mut lines = vec![
        Line::styled(
            format!("  {}", component.name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
    ];

    match (offers, error) {
        (_, Some(error)) => lines.push(Line::styled(
            format!("  {error}"),
            Style::default().fg(app.theme.error),
        )),
        (None, None) => lines.push(Line::styled(
            format!("  {} Loading offers…", app.spinner()),
            muted,
        )),
        (Some([]), None) => lines.push(Line::styled("  No shop has this in stock.", muted)),
        (Some(offers), None) => {
            for (i, offer) in offers.iter().enumerate() {
                let style = if i == selected {
                    Style::default()
                        .bg(app.theme.selection_bg)
                        .fg(app.theme.foreground)
                } else {
                    Style::default().fg(app.theme.foreground)
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {}", pad_to_width(&offer.shop_name, 16)), style),
                    Span::styled(
                        format!("{:>10}  ", format_price(Some(offer.price))),
                        style.fg(app.theme.price),
                    ),
                    Span::styled(pad_to_width(&offer.availability, 14), style),
                    Span::styled(offer.url.clone(), muted),
                ]));
            }
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("  ↑/↓: move │ Esc: close", muted));
    lines
}

fn notification_lines(
    app: &App,
    items: Option<&[Notification]>,
    error: Option<&str>,
    selected: usize,
) -> Vec<Line<'static>> {
    let muted = Style::default().fg(app.theme.muted);
    let mut lines = vec![Line::raw("")];

    match (items, error) {
        (_, Some(error)) => lines.push(Line::styled(
            format!("  {error}"),
            Style::default().fg(app.theme.error),
        )),
        (None, None) => lines.push(Line::styled(
            format!("  {} Loading…", app.spinner()),
            muted,
        )),
        (Some([]), None) => lines.push(Line::styled(
            "  Nothing yet. Set alerts with `a` on a component.",
            muted,
        )),
        (Some(items), None) => {
            for (i, n) in items.iter().enumerate() {
                let mut style = if n.is_read {
                    muted
                } else {
                    Style::default()
                        .fg(app.theme.foreground)
                        .add_modifier(Modifier::BOLD)
                };
                if i == selected {
                    style = style.bg(app.theme.selection_bg);
                }
                lines.push(Line::from(vec![
                    Span::styled(
                        if n.is_read { "    " } else { "  ● " },
                        Style::default().fg(app.theme.highlight),
                    ),
                    Span::styled(
                        format!("{}  ", n.created_at.format("%Y-%m-%d %H:%M")),
                        muted,
                    ),
                    Span::styled(n.headline(), style),
                ]));
            }
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  ↑/↓: move │ Enter: mark read │ Esc: close",
        muted,
    ));
    lines
}

fn save_lines(
    app: &App,
    name: &str,
    updating: bool,
    error: Option<&str>,
    saving: bool,
) -> Vec<Line<'static>> {
    let muted = Style::default().fg(app.theme.muted);
    let mut lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled("  Name  ", Style::default().fg(app.theme.highlight)),
            Span::styled(
                format!("{name}▏"),
                Style::default().fg(app.theme.foreground),
            ),
        ]),
        Line::raw(""),
    ];
    if saving {
        lines.push(Line::styled(format!("  {} Saving…", app.spinner()), muted));
    } else if let Some(error) = error {
        lines.push(Line::styled(
            format!("  {error}"),
            Style::default().fg(app.theme.error),
        ));
    } else if updating {
        lines.push(Line::styled(
            "  Updates the loaded build (Ctrl-N: save as new)",
            muted,
        ));
    } else {
        lines.push(Line::styled(
            format!("  {} parts", app.workflow.selection().len()),
            muted,
        ));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled("  Enter: save │ Esc: cancel", muted));
    lines
}

fn build_lines(
    app: &App,
    entries: &[BuildEntry],
    loading: bool,
    selected: usize,
) -> Vec<Line<'static>> {
    let muted = Style::default().fg(app.theme.muted);
    let mut lines = vec![Line::raw("")];

    if loading {
        lines.push(Line::styled(format!("  {} Loading…", app.spinner()), muted));
    } else if entries.is_empty() {
        lines.push(Line::styled("  No builds to load.", muted));
    }
    for (i, entry) in entries.iter().enumerate() {
        let style = if i == selected {
            Style::default()
                .bg(app.theme.selection_bg)
                .fg(app.theme.foreground)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.foreground)
        };
        let parts = entry
            .components
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", entry.label), style),
            Span::styled(
                format!("  ({} parts) ", entry.components.len()),
                muted,
            ),
            Span::styled(truncate_to_width(&parts, 60), muted),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  Enter: load │ d: delete saved build │ Esc: close",
        muted,
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Session, TokenStore};
    use crate::config::Config;
    use crate::logging::LogBuffer;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            // Nothing listens here; every fetch fails fast
            api_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let session = Session::restore(TokenStore::new(dir.path().join("auth.toml")));
        let (tx, _rx) = mpsc::channel(16);
        (App::new(&config, session, LogBuffer::new(), tx).unwrap(), dir)
    }

    #[tokio::test]
    async fn main_screen_renders_tabs_and_summary() {
        let (app, _dir) = app();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("uconf"));
        assert!(text.contains("1 CPU"));
        assert!(text.contains("Build"));
        assert!(text.contains("Pick parts with Enter"));
        assert!(text.contains("not logged in"));
    }

    #[tokio::test]
    async fn help_overlay_renders_on_small_terminal() {
        let (mut app, _dir) = app();
        app.overlay = Some(Overlay::Help);
        let mut terminal = Terminal::new(TestBackend::new(50, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Keys"));
    }

    #[tokio::test]
    async fn password_is_masked() {
        let (mut app, _dir) = app();
        let mut form = AuthForm::login();
        form.email = "user@example.com".into();
        form.password = "hunter22".into();
        app.overlay = Some(Overlay::Auth(form));

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("user@example.com"));
        assert!(!text.contains("hunter22"));
        assert!(text.contains("••••••••"));
    }
}
