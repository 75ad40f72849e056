use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use hyper::StatusCode;
use serde::Deserialize;

use super::AppState;
use crate::console::FormUpdate;
use crate::console::filters::ContentFilter;
use crate::console::form::FormState;
use crate::console::format::ReturnFormat;
use crate::prompts::SavedPrompt;
use crate::render::{escape_html, Rendered};

const TITLE: &str = "Prompt Console";

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let form = state.console.snapshot().await;
    let saved = state.console.saved_prompts().await;
    let rendered = state.console.rendered_result().await;
    Html(render_page(&form, &saved, &rendered))
}

#[derive(Debug, Deserialize)]
pub struct PageForm {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub return_format: ReturnFormat,
    pub action: String,
}

#[derive(Debug, PartialEq, Eq)]
enum PageAction {
    Run,
    Save,
    Toggle(ContentFilter),
}

fn parse_action(action: &str) -> Option<PageAction> {
    match action {
        "run" => Some(PageAction::Run),
        "save" => Some(PageAction::Save),
        other => other
            .strip_prefix("filter:")
            .and_then(|tag| tag.parse().ok())
            .map(PageAction::Toggle),
    }
}

/// Every button on the page posts the whole form so typed text is never lost.
#[tracing::instrument(skip_all)]
pub async fn submit_form(State(state): State<AppState>, Form(body): Form<PageForm>) -> Response {
    tracing::debug!(action = %body.action, "Page form submitted");
    let Some(action) = parse_action(&body.action) else {
        return (StatusCode::BAD_REQUEST, "unknown action").into_response();
    };

    state
        .console
        .update_form(FormUpdate {
            prompt: Some(body.prompt),
            input: Some(body.input),
            return_format: Some(body.return_format),
        })
        .await;

    match action {
        PageAction::Run => {
            state.console.run_current().await;
        }
        PageAction::Save => {
            // A blank prompt leaves its message in the form's error banner.
            if let Err(e) = state.console.save_current().await {
                tracing::debug!(error = %e, "Save rejected");
            }
        }
        PageAction::Toggle(filter) => {
            state.console.toggle_filter(filter).await;
        }
    }

    Redirect::to("/").into_response()
}

pub async fn rerun_saved(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.console.rerun(&id).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

pub fn render_page(form: &FormState, saved: &[SavedPrompt], rendered: &Rendered) -> String {
    let mut body = String::new();

    body.push_str(&format!("<h1>{TITLE}</h1>\n"));
    body.push_str(&form_section(form));

    if form.loading {
        body.push_str(r#"<div class="banner loading">Processing your request...</div>"#);
        body.push('\n');
    }
    if let Some(error) = &form.error {
        body.push_str(&format!(
            "<div class=\"banner error\">{}</div>\n",
            escape_html(error)
        ));
    }
    if !form.result.is_empty() {
        body.push_str(&format!(
            "<section class=\"result\"><h2>Result ({} format)</h2>\n{}\n</section>\n",
            rendered.format, rendered.html
        ));
    }
    if !saved.is_empty() {
        body.push_str(&saved_section(saved));
    }

    // Poll while a stream is filling the result.
    let refresh = if form.loading {
        "<meta http-equiv=\"refresh\" content=\"1\">\n"
    } else {
        ""
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n{refresh}<title>Prompt Console</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n{body}</main>\n</body>\n</html>\n"
    )
}

fn form_section(form: &FormState) -> String {
    let formats: String = ReturnFormat::ALL
        .iter()
        .map(|f| {
            let selected = if *f == form.return_format { " selected" } else { "" };
            format!("<option value=\"{f}\"{selected}>{}</option>", f.label())
        })
        .collect();

    let filters: String = ContentFilter::ALL
        .iter()
        .map(|f| {
            let (class, mark) = if form.is_selected(*f) {
                ("filter on", "&#9745;")
            } else {
                ("filter", "&#9744;")
            };
            format!(
                "<button type=\"submit\" name=\"action\" value=\"filter:{f}\" class=\"{class}\">{mark} {f}</button>"
            )
        })
        .collect();

    format!(
        r#"<section class="card">
<h2>Create or Run a Prompt</h2>
<form method="post" action="/form">
<button type="submit" name="action" value="run" hidden></button>
<label for="prompt">Prompt Template</label>
<input type="text" id="prompt" name="prompt" value="{prompt}" placeholder="Enter your prompt template, e.g., 'Tell me a story about {{input}}'">
<label for="input">Input Value</label>
<input type="text" id="input" name="input" value="{input}" placeholder="Enter input value">
<label for="return_format">Return Format</label>
<select id="return_format" name="return_format">{formats}</select>
<label>Prompt Guard Options</label>
<div class="filters">{filters}</div>
<div class="actions">
<button type="submit" name="action" value="run" class="run">Run Prompt</button>
<button type="submit" name="action" value="save" class="save">Save Prompt</button>
</div>
</form>
</section>
"#,
        prompt = escape_html(&form.prompt),
        input = escape_html(&form.input),
    )
}

fn saved_section(saved: &[SavedPrompt]) -> String {
    let items: String = saved
        .iter()
        .map(|p| {
            format!(
                r#"<li><div><b>Prompt:</b> {prompt}</div><div><b>Input:</b> {input}</div><form method="post" action="/saved/{id}/run"><button type="submit" class="run">Run This Prompt</button></form></li>"#,
                prompt = escape_html(&p.prompt),
                input = escape_html(&p.input),
                id = escape_html(&p.id),
            )
        })
        .collect();
    format!("<section class=\"card\"><h2>Saved Prompts</h2>\n<ul>{items}</ul>\n</section>\n")
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;padding:3rem 1rem;background:#f9fafb;color:#111827}\
main{max-width:48rem;margin:0 auto}\
.card,.result{background:#fff;border-radius:.5rem;padding:1.5rem;margin-bottom:2rem;box-shadow:0 1px 2px rgba(0,0,0,.08)}\
label{display:block;font-size:.875rem;font-weight:500;margin-top:1rem}\
input,select{width:100%;padding:.5rem .75rem;border:1px solid #d1d5db;border-radius:.375rem;box-sizing:border-box}\
.filters{display:flex;flex-wrap:wrap;gap:.5rem;margin-top:.5rem}\
.filter{background:#f3f4f6;border:1px solid #d1d5db;border-radius:.375rem;padding:.25rem .5rem;cursor:pointer}\
.filter.on{background:#e0e7ff;border-color:#6366f1}\
.actions{display:flex;gap:1rem;margin-top:1.5rem}\
.run,.save{flex:1;color:#fff;border:0;border-radius:.375rem;padding:.5rem 1rem;cursor:pointer}\
.run{background:#4f46e5}.save{background:#16a34a}\
.banner{border-left:4px solid;padding:1rem;margin-bottom:2rem}\
.loading{background:#fefce8;border-color:#facc15}\
.error{background:#fef2f2;border-color:#f87171;color:#b91c1c}\
pre{white-space:pre-wrap;word-break:break-word;background:#f3f4f6;padding:1rem;border-radius:.375rem}\
ul{list-style:none;padding:0}li{background:#f9fafb;border-radius:.5rem;padding:1rem;margin-bottom:1rem}";
