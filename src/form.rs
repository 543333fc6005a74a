use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Debug)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

impl FormField {
    pub fn required(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            required: true,
        }
    }

    pub fn optional(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            required: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    NewProduct,
    ContactSettings,
}

/// A popup of labelled text fields edited in place.
#[derive(Clone, Debug)]
pub struct FormState {
    pub kind: FormKind,
    pub title: &'static str,
    pub hint: &'static str,
    pub fields: Vec<FormField>,
    pub selected: usize,
    pub error: Option<String>,
}

pub enum FormKeyResult {
    Continue,
    Cancel,
    Submit(Vec<String>),
}

impl FormState {
    pub fn new(
        kind: FormKind,
        title: &'static str,
        hint: &'static str,
        fields: Vec<FormField>,
    ) -> Self {
        Self {
            kind,
            title,
            hint,
            fields,
            selected: 0,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult {
        self.error = None;
        match key.code {
            KeyCode::Esc => FormKeyResult::Cancel,
            KeyCode::Enter => match self.validate() {
                Ok(()) => FormKeyResult::Submit(self.values()),
                Err(err) => {
                    self.error = Some(err);
                    FormKeyResult::Continue
                }
            },
            KeyCode::Tab | KeyCode::Down => {
                self.next_field();
                FormKeyResult::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.previous_field();
                FormKeyResult::Continue
            }
            KeyCode::Backspace => {
                if let Some(value) = self.active_value_mut() {
                    value.pop();
                }
                FormKeyResult::Continue
            }
            KeyCode::Delete => {
                if let Some(value) = self.active_value_mut() {
                    value.clear();
                }
                FormKeyResult::Continue
            }
            KeyCode::Char(c) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    if let Some(value) = self.active_value_mut() {
                        value.push(c);
                    }
                }
                FormKeyResult::Continue
            }
            _ => FormKeyResult::Continue,
        }
    }

    pub fn select(&mut self, index: usize) {
        if index < self.fields.len() {
            self.selected = index;
        }
    }

    pub fn values(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| field.value.trim().to_string())
            .collect()
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.selected = 0;
        self.error = None;
    }

    fn validate(&self) -> Result<(), String> {
        match self
            .fields
            .iter()
            .find(|field| field.required && field.value.trim().is_empty())
        {
            Some(field) => Err(format!("{} is required", field.label)),
            None => Ok(()),
        }
    }

    fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + 1) % self.fields.len();
        }
    }

    fn previous_field(&mut self) {
        if self.fields.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.selected = self.fields.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        self.fields.get_mut(self.selected).map(|field| &mut field.value)
    }
}
