//! Interactive dashboard session.
//!
//! Menu-driven stand-in for the browser controls (year selector, compare
//! toggle, sort selector, bubble click) using `dialoguer`. Each action
//! re-renders and prints the resulting grid.

use chile_dashboard_bubbles_models::{EngineConfig, LegendModel, RenderFrame};
use chile_dashboard_dataset::DatasetSource;
use chile_dashboard_dataset_models::{Dataset, SortKey, Year};
use dialoguer::{Input, Select};

use crate::controller::{Controller, View};

/// Actions offered by the interactive menu.
enum Action {
    SelectYear,
    Compare,
    Sort,
    Detail,
    CloseDetail,
    Legend,
    Resize,
    Reload,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::SelectYear,
        Self::Compare,
        Self::Sort,
        Self::Detail,
        Self::CloseDetail,
        Self::Legend,
        Self::Resize,
        Self::Reload,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::SelectYear => "Select year",
            Self::Compare => "Compare first and last year",
            Self::Sort => "Change sort order",
            Self::Detail => "Show region detail",
            Self::CloseDetail => "Close region detail",
            Self::Legend => "Show legend",
            Self::Resize => "Resize container",
            Self::Reload => "Reload dataset",
            Self::Quit => "Quit",
        }
    }
}

/// Prints a frame as a table in display order.
pub fn print_frame(frame: &RenderFrame) {
    println!();
    println!(
        "{} — ordered by {} ({} columns x {} rows{})",
        frame.year,
        frame.sort.metric().label(),
        frame.layout.columns,
        frame.layout.rows,
        if frame.layout.overflow {
            ", overflowing"
        } else {
            ""
        }
    );

    if let Some(placeholder) = &frame.placeholder {
        println!("{placeholder}");
        return;
    }

    println!(
        "{:<4} {:<22} {:>8} {:>8} {:>7} {:>7}  VALUES",
        "#", "REGION", "X", "Y", "RADIUS", "BORDER"
    );
    println!("{}", "-".repeat(80));
    for (i, bubble) in frame.bubbles.iter().enumerate() {
        println!(
            "{:<4} {:<22} {:>8.1} {:>8.1} {:>7.1} {:>7.2}  {} {}",
            i + 1,
            bubble.label_text,
            bubble.x,
            bubble.y,
            bubble.radius,
            bubble.border_width,
            bubble.fill_color,
            bubble.value_text.join(" · "),
        );
    }
}

/// Prints the legends of a frame.
pub fn print_legend(legend: &LegendModel) {
    if let Some(color) = &legend.color {
        let ticks: Vec<&str> = color.ticks.iter().map(|t| t.label.as_str()).collect();
        println!(
            "{}: {} → {}  [{}]",
            color.title,
            color.stops.first().map(|s| s.color.to_hex()).unwrap_or_default(),
            color.stops.last().map(|s| s.color.to_hex()).unwrap_or_default(),
            ticks.join(", ")
        );
    }
    if let Some(size) = &legend.size {
        println!(
            "{}: r {:.1}..{:.1}  {} / {}",
            size.title, size.r_min, size.r_max, size.low_label, size.high_label
        );
    }
    if let Some(border) = &legend.border {
        println!(
            "{}: {:.1}..{:.1}px  {} / {}",
            border.title, border.width_min, border.width_max, border.low_label, border.high_label
        );
    }
}

fn print_view(view: &View) {
    println!("\n== {} ==", view.mode);
    print_frame(&view.frame);
    if let Some(detail) = &view.detail {
        println!("\n{detail}");
    }
}

/// Runs the interactive dashboard until the user quits.
///
/// # Errors
///
/// Returns an error if the initial dataset load, the configuration or a
/// prompt fails. Failed reloads are reported and the session continues.
pub async fn run(
    source: DatasetSource,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Chile Regional Dashboard");
    println!("Loading {source}...");

    let dataset = source.load().await?;
    let mut controller = Controller::new(config, dataset)?;
    print_view(&controller.refresh()?);

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt(format!(
                "Dashboard ({}, {})",
                controller.mode(),
                controller.sort().metric().label()
            ))
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::SelectYear => {
                let Some(year) = pick_year(controller.dataset())? else {
                    continue;
                };
                print_view(&controller.select_year(year)?);
            }
            Action::Compare => print_view(&controller.compare()?),
            Action::Sort => {
                let sort = pick_sort(controller.sort())?;
                print_view(&controller.set_sort(sort)?);
            }
            Action::Detail => handle_detail(&mut controller)?,
            Action::CloseDetail => {
                controller.close_detail();
                println!("Detail closed.");
            }
            Action::Legend => {
                let view = controller.refresh()?;
                println!();
                print_legend(&view.frame.legend);
            }
            Action::Resize => handle_resize(&mut controller)?,
            Action::Reload => match controller.reload(source.load().await) {
                Ok(view) => print_view(&view),
                Err(e) => println!("No se pudieron recargar los datos: {e}"),
            },
            Action::Quit => break,
        }
    }

    Ok(())
}

fn pick_year(dataset: &Dataset) -> Result<Option<Year>, Box<dyn std::error::Error>> {
    if dataset.years.is_empty() {
        println!("No years available.");
        return Ok(None);
    }

    let labels: Vec<String> = dataset
        .years
        .iter()
        .map(|year| format!("{year} ({} regions)", dataset.rows_for(*year).len()))
        .collect();

    let idx = Select::new()
        .with_prompt("Year")
        .items(&labels)
        .default(labels.len() - 1)
        .interact()?;

    Ok(Some(dataset.years[idx]))
}

fn pick_sort(current: SortKey) -> Result<SortKey, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = SortKey::all().iter().map(|k| k.metric().label()).collect();
    let default = SortKey::all()
        .iter()
        .position(|k| *k == current)
        .unwrap_or_default();

    let idx = Select::new()
        .with_prompt("Sort by")
        .items(&labels)
        .default(default)
        .interact()?;

    Ok(SortKey::all()[idx])
}

/// Opens a region's detail either by name or by clicking a point.
fn handle_detail(controller: &mut Controller) -> Result<(), Box<dyn std::error::Error>> {
    let year = controller.mode().bubble_year();
    let mut regions: Vec<String> = controller
        .dataset()
        .rows_for(year)
        .iter()
        .map(|r| r.region.clone())
        .collect();
    if regions.is_empty() {
        println!("No regions in {year}.");
        return Ok(());
    }
    regions.push("Click at coordinates...".to_owned());

    let idx = Select::new()
        .with_prompt("Region")
        .items(&regions)
        .default(0)
        .interact()?;

    let detail = if idx + 1 == regions.len() {
        let x: f64 = Input::new().with_prompt("x").interact_text()?;
        let y: f64 = Input::new().with_prompt("y").interact_text()?;
        controller.click(x, y)
    } else {
        controller.open_detail(&regions[idx])
    };

    match detail {
        Some(detail) => println!("\n{detail}"),
        None => println!("No region there."),
    }
    Ok(())
}

fn handle_resize(controller: &mut Controller) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = controller.engine().container();
    let width: f64 = Input::new()
        .with_prompt("Width")
        .default(width)
        .interact_text()?;
    let height: f64 = Input::new()
        .with_prompt("Height")
        .default(height)
        .interact_text()?;

    match controller.resize(width, height) {
        Ok(Some(frame)) => print_frame(&frame),
        Ok(None) => println!("Nothing rendered yet."),
        Err(e) => println!("{e}"),
    }
    Ok(())
}
