//! HTML rendering for every page the service serves.

use chrono::{DateTime, Utc};

use crate::polls::forms::{
    BulkChoiceForm, ChoiceEntry, ChoiceFormSet, CreateQuestionForm, FormErrors, QuestionForm,
};
use crate::polls::{Question, QuestionWithChoices, User};

pub const NO_POLLS: &str = "No polls are available.";
pub const NO_OWN_POLLS: &str = "You have not created any polls yet.";
pub const NO_SELECTION: &str = "You did not select a choice.";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn date(when: &DateTime<Utc>) -> String {
    when.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn question_links(questions: &[Question], now: DateTime<Utc>) -> String {
    let mut list = String::from("<ul>\n");
    for q in questions {
        let badge = if q.was_published_recently(now) { " <em>new</em>" } else { "" };
        list.push_str(&format!(
            "<li><a href=\"/{}/\">{}</a>{badge}</li>\n",
            q.id,
            escape(&q.question_text)
        ));
    }
    list.push_str("</ul>\n");
    list
}

pub fn index(questions: &[Question], now: DateTime<Utc>) -> String {
    let body = if questions.is_empty() {
        format!("<h1>Polls</h1>\n<p>{NO_POLLS}</p>\n")
    } else {
        format!("<h1>Polls</h1>\n{}", question_links(questions, now))
    };
    layout("Polls", &body)
}

pub fn detail(poll: &QuestionWithChoices, error_message: Option<&str>) -> String {
    let question = &poll.question;
    let mut body = format!(
        "<form action=\"/{}/vote/\" method=\"post\">\n<fieldset>\n<legend><h1>{}</h1></legend>\n",
        question.id,
        escape(&question.question_text)
    );
    if let Some(message) = error_message {
        body.push_str(&format!("<p class=\"error\"><strong>{}</strong></p>\n", escape(message)));
    }
    for (i, choice) in poll.choices.iter().enumerate() {
        body.push_str(&format!(
            "<input type=\"radio\" name=\"choice\" id=\"choice{n}\" value=\"{id}\">\n\
             <label for=\"choice{n}\">{text}</label><br>\n",
            n = i + 1,
            id = choice.id,
            text = escape(&choice.choice_text),
        ));
    }
    body.push_str("</fieldset>\n<input type=\"submit\" value=\"Vote\">\n</form>\n");
    layout(&question.question_text, &body)
}

pub fn results(poll: &QuestionWithChoices) -> String {
    let question = &poll.question;
    let mut body = format!("<h1>{}</h1>\n<ul>\n", escape(&question.question_text));
    for choice in &poll.choices {
        body.push_str(&format!(
            "<li>{} -- {} {}</li>\n",
            escape(&choice.choice_text),
            choice.votes,
            choice.votes_label()
        ));
    }
    body.push_str(&format!(
        "</ul>\n<p>Total votes: {}</p>\n<a href=\"/{}/\">Vote again?</a>\n",
        poll.total_votes(),
        question.id
    ));
    layout(&question.question_text, &body)
}

pub fn my_questions(user: &User, questions: &[Question], now: DateTime<Utc>) -> String {
    let mut body = format!("<h1>Polls by {}</h1>\n", escape(&user.username));
    if questions.is_empty() {
        body.push_str(&format!("<p>{NO_OWN_POLLS}</p>\n"));
    } else {
        body.push_str("<ul>\n");
        for q in questions {
            let badge = if q.was_published_recently(now) { " <em>new</em>" } else { "" };
            body.push_str(&format!(
                "<li><a href=\"/{}/\">{}</a> <small>{}</small>{badge}</li>\n",
                q.id,
                escape(&q.question_text),
                date(&q.pub_date)
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str(
        "<p><a href=\"/create/simple/\">New poll</a> | \
         <a href=\"/create/advanced/\">New poll (one field per choice)</a></p>\n",
    );
    layout("My polls", &body)
}

fn error_list(messages: impl IntoIterator<Item = String>) -> String {
    let items: String = messages
        .into_iter()
        .map(|m| format!("<li>{}</li>", escape(&m)))
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"errorlist\">{items}</ul>\n")
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    error_list(errors.field(field).iter().map(|e| e.message().to_owned()))
}

fn text_input(label: &str, name: &str, value: &str, errors: &FormErrors) -> String {
    format!(
        "{}<label for=\"id_{name}\">{label}</label>\n\
         <input type=\"text\" name=\"{name}\" id=\"id_{name}\" maxlength=\"200\" value=\"{}\">\n",
        field_errors(errors, name),
        escape(value),
    )
}

fn bulk_fields(form: &BulkChoiceForm, errors: &FormErrors) -> String {
    format!(
        "{}<label for=\"id_{name}\">Choices</label>\n\
         <textarea name=\"{name}\" id=\"id_{name}\" rows=\"5\">{}</textarea>\n\
         <p class=\"help\">Enter each choice on its own line.</p>\n",
        field_errors(errors, BulkChoiceForm::FIELD),
        escape(&form.choices_text),
        name = BulkChoiceForm::FIELD,
    )
}

fn formset_fields(formset: &ChoiceFormSet, errors: &FormErrors) -> String {
    let mut fields = format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        ChoiceFormSet::total_forms_field(),
        formset.forms.len()
    );
    for (i, value) in formset.forms.iter().enumerate() {
        fields.push_str(&text_input(
            &format!("Choice {}", i + 1),
            &ChoiceFormSet::field_name(i),
            value,
            errors,
        ));
    }
    fields
}

pub fn create_question(form: &CreateQuestionForm, errors: &FormErrors) -> String {
    let (action, choice_fields) = match &form.choices {
        ChoiceEntry::Bulk(bulk) => ("/create/simple/", bulk_fields(bulk, errors)),
        ChoiceEntry::Fields(formset) => ("/create/advanced/", formset_fields(formset, errors)),
    };
    let body = format!(
        "<h1>New poll</h1>\n{}<form action=\"{action}\" method=\"post\">\n{}{choice_fields}\
         <input type=\"submit\" value=\"Create\">\n</form>\n",
        error_list(errors.non_field().iter().map(|e| e.message().to_owned())),
        text_input("Question", QuestionForm::FIELD, &form.question.question_text, errors),
    );
    layout("New poll", &body)
}

pub fn not_found() -> String {
    layout("Not found", "<h1>Not found</h1>\n<p>The requested poll does not exist.</p>\n")
}

pub fn server_error() -> String {
    layout("Server error", "<h1>Server error</h1>\n<p>Something went wrong. Please try again.</p>\n")
}
