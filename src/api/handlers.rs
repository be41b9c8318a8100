use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::config::{AppConfig, LabelConfig};
use crate::viewer::{build_controls, Dataset, Selection, ViewController};

const PAGE_TEMPLATE: &str = include_str!("../../static/index.html");
const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

/// Estado compartido (solo lectura) entre todos los workers.
pub struct AppState {
    pub dataset: Dataset,
    pub controller: ViewController,
    pub labels: LabelConfig,
    page: String,
}

impl AppState {
    pub fn new(dataset: Dataset, config: &AppConfig) -> Self {
        Self {
            dataset,
            controller: ViewController::new(config.map.clone(), config.style.clone()),
            labels: config.labels.clone(),
            page: render_page(&config.server.title, &config.server.heading),
        }
    }
}

/// Parámetros de `GET /api/view`: listas separadas por comas.
#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    routes: Option<String>,
    versions: Option<String>,
}

impl ViewQuery {
    fn into_selection(self) -> Selection {
        Selection::new(split_list(self.routes), split_list(self.versions))
    }
}

pub async fn index(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(state.page.clone())
}

pub async fn get_controls(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(build_controls(&state.dataset, &state.labels))
}

pub async fn post_view(state: web::Data<AppState>, selection: web::Json<Selection>) -> impl Responder {
    HttpResponse::Ok().json(state.controller.render(&state.dataset, &selection))
}

pub async fn get_view(state: web::Data<AppState>, query: web::Query<ViewQuery>) -> impl Responder {
    let selection = query.into_inner().into_selection();
    HttpResponse::Ok().json(state.controller.render(&state.dataset, &selection))
}

pub async fn robots() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(ROBOTS_TXT)
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn render_page(title: &str, heading: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{title}}", &escape_html(title))
        .replace("{{heading}}", &escape_html(heading))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
