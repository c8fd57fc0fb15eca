mod backend;
mod config;
mod history;
mod lmstudio;
mod logbuf;
mod metrics;
mod ollama;
mod prompts;
mod selection;

use iced::{
    widget::{button, column, container, pick_list, row, scrollable, text, text_editor, text_input},
    Element, Length, Task, Theme, Font, Subscription,
    time, clipboard,
    alignment,
    window,
};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;

use backend::{BackendClient, BackendKind, ChatMessage};
use config::Config;
use prompts::PromptRegistry;

fn main() -> iced::Result {
    let config = Config::load();

    iced::application("Scribe Bar", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(App::new)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Improve,
    Chat,
    Prompts,
    Logs,
    Stats,
}

impl Pane {
    const ALL: [Pane; 5] = [Pane::Improve, Pane::Chat, Pane::Prompts, Pane::Logs, Pane::Stats];

    fn label(self) -> &'static str {
        match self {
            Pane::Improve => "Improve",
            Pane::Chat => "Chat",
            Pane::Prompts => "Prompts",
            Pane::Logs => "Logs",
            Pane::Stats => "Stats",
        }
    }
}

#[derive(Debug, Clone)]
enum Message {
    PaneSelected(Pane),
    BackendPicked(BackendKind),
    ModelPicked(String),
    RefreshModels,
    ModelsFetched(Result<Vec<String>, String>),
    Tick,
    StatsTick,

    ImprovePromptPicked(String),
    ImproveInputEdited(text_editor::Action),
    GrabSelection,
    SelectionGrabbed(Result<Option<String>, String>),
    Enhance,
    EnhanceFinished(Result<String, String>),
    CopyOutput,
    ReplaceSelection,
    SelectionReplaced(Result<(), String>),
    EnhanceSelection,
    EnhanceSelectionFinished(Result<String, String>),

    ChatInputChanged(String),
    ChatSend,
    ChatReplied(Result<String, String>),
    NewConversation,
    DeleteConversation,

    EditorPromptPicked(String),
    EditorNameChanged(String),
    EditorBodyEdited(text_editor::Action),
    EditorNew,
    EditorSave,
    EditorDelete,
    EditorApply,

    LogLevelPicked(logbuf::Level),
    LogsClear,
    LogsSave,
}

struct App {
    pane: Pane,
    status: String,
    loading_frame: usize,

    config: Config,
    client: Arc<Mutex<BackendClient>>,
    models: Vec<String>,

    registry: PromptRegistry,
    prompt_names: Arc<StdMutex<Vec<String>>>,

    improve_prompt: Option<String>,
    improve_input: text_editor::Content,
    improve_output: String,
    improve_loading: bool,

    chat_input: String,
    chat_messages: Vec<ChatMessage>,
    conversation_id: Option<i64>,
    chat_loading: bool,

    editor_selected: Option<String>,
    editor_name: String,
    editor_body: text_editor::Content,
    editor_dirty: bool,

    log_level: logbuf::Level,

    stats: metrics::MetricsSnapshot,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = Config::load();

        if let Err(e) = history::init() {
            logbuf::log_with(
                logbuf::Level::Error,
                format!("Error opening chat history: {}", e),
            );
        }

        let mut registry = PromptRegistry::load();

        // Shared name cache feeding the improver and editor dropdowns; the
        // registry refreshes it on every mutation.
        let prompt_names = Arc::new(StdMutex::new(registry.list()));
        let cache = prompt_names.clone();
        registry.subscribe(move |names| {
            let mut guard = cache
                .lock()
                .map_err(|_| anyhow::anyhow!("prompt name cache poisoned"))?;
            *guard = names.to_vec();
            Ok(())
        });
        registry.subscribe(|names| {
            logbuf::log(format!("Prompt list updated ({} templates)", names.len()));
            Ok(())
        });

        let (conversation_id, chat_messages) = restore_latest_conversation();

        metrics::spawn_sampler();

        let client = Arc::new(Mutex::new(BackendClient::from_config(&config)));

        let app = App {
            pane: Pane::Improve,
            status: String::from("Ready"),
            loading_frame: 0,
            config,
            client,
            models: Vec::new(),
            registry,
            prompt_names,
            improve_prompt: None,
            improve_input: text_editor::Content::new(),
            improve_output: String::new(),
            improve_loading: false,
            chat_input: String::new(),
            chat_messages,
            conversation_id,
            chat_loading: false,
            editor_selected: None,
            editor_name: String::new(),
            editor_body: text_editor::Content::new(),
            editor_dirty: false,
            log_level: logbuf::Level::Info,
            stats: metrics::MetricsSnapshot::default(),
        };

        let refresh = app.refresh_models_task();
        (app, refresh)
    }

    fn refresh_models_task(&self) -> Task<Message> {
        let client = self.client.clone();
        Task::future(async move {
            let result = client.lock().await.fetch_models().await;
            Message::ModelsFetched(result.map_err(|e| e.to_string()))
        })
    }

    fn prompt_names(&self) -> Vec<String> {
        self.prompt_names
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            logbuf::log_with(logbuf::Level::Error, format!("Error saving config: {}", e));
        }
    }

    fn persist_chat(&mut self, role: &str, content: &str) {
        if self.conversation_id.is_none() {
            let title: String = content.chars().take(48).collect();
            match history::start_conversation(&title) {
                Ok(id) => self.conversation_id = Some(id),
                Err(e) => {
                    logbuf::log_with(
                        logbuf::Level::Error,
                        format!("Error creating conversation: {}", e),
                    );
                    return;
                }
            }
        }
        if let Some(id) = self.conversation_id {
            if let Err(e) = history::add_message(id, role, content) {
                logbuf::log_with(
                    logbuf::Level::Error,
                    format!("Error recording chat message: {}", e),
                );
            }
        }
    }

    fn fail(&mut self, context: &str, error: String) {
        logbuf::log_with(logbuf::Level::Error, format!("{}: {}", context, error));
        self.status = format!("{}: {}", context, error);
    }

    fn picked_template(&mut self) -> Option<prompts::PromptTemplate> {
        let Some(name) = self.improve_prompt.clone() else {
            self.status = String::from("Pick a prompt template first");
            return None;
        };
        let template = self.registry.template(&name).cloned();
        if template.is_none() {
            self.status = format!("Template not found: {}", name);
        }
        template
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PaneSelected(pane) => {
                self.pane = pane;
                Task::none()
            }
            Message::BackendPicked(kind) => {
                if self.config.backend == kind {
                    return Task::none();
                }
                self.config.backend = kind;
                self.client = Arc::new(Mutex::new(BackendClient::from_config(&self.config)));
                self.models.clear();
                self.save_config();
                logbuf::log(format!("Backend switched to {}", kind));
                self.status = format!("Backend: {}", kind);
                self.refresh_models_task()
            }
            Message::ModelPicked(model) => {
                self.config.model = model;
                self.save_config();
                Task::none()
            }
            Message::RefreshModels => {
                self.status = String::from("Refreshing models...");
                self.refresh_models_task()
            }
            Message::ModelsFetched(Ok(models)) => {
                // Keep the previous selection when the backend still serves
                // it, otherwise fall back to the first model.
                if !models.contains(&self.config.model) {
                    self.config.model = models.first().cloned().unwrap_or_default();
                }
                self.models = models;
                self.save_config();
                self.status = format!("{} models available", self.models.len());
                Task::none()
            }
            Message::ModelsFetched(Err(e)) => {
                self.fail("Error fetching models", e);
                Task::none()
            }
            Message::Tick => {
                if self.improve_loading || self.chat_loading {
                    self.loading_frame = (self.loading_frame + 1) % 80;
                }
                Task::none()
            }
            Message::StatsTick => {
                self.stats = metrics::snapshot();
                Task::none()
            }

            Message::ImprovePromptPicked(name) => {
                self.improve_prompt = Some(name);
                Task::none()
            }
            Message::ImproveInputEdited(action) => {
                self.improve_input.perform(action);
                Task::none()
            }
            Message::GrabSelection => Task::future(async move {
                let result = tokio::task::spawn_blocking(selection::capture_selection).await;
                let flattened = match result {
                    Ok(inner) => inner.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                Message::SelectionGrabbed(flattened)
            }),
            Message::SelectionGrabbed(Ok(Some(selected))) => {
                self.improve_input = text_editor::Content::with_text(&selected);
                self.status = String::from("Selection captured");
                Task::none()
            }
            Message::SelectionGrabbed(Ok(None)) => {
                self.status = String::from("No text selected");
                Task::none()
            }
            Message::SelectionGrabbed(Err(e)) => {
                self.fail("Error capturing selection", e);
                Task::none()
            }
            Message::Enhance => {
                if self.improve_loading {
                    return Task::none();
                }
                let input = self.improve_input.text().trim().to_string();
                if input.is_empty() {
                    self.status = String::from("Nothing to enhance");
                    return Task::none();
                }
                let Some(template) = self.picked_template() else {
                    return Task::none();
                };
                let prompt = template.fill(&input);

                self.improve_loading = true;
                self.improve_output.clear();
                let client = self.client.clone();
                let model = self.config.model.clone();
                Task::future(async move {
                    let result = client.lock().await.generate(&prompt, &model).await;
                    Message::EnhanceFinished(result.map_err(|e| e.to_string()))
                })
            }
            Message::EnhanceFinished(Ok(output)) => {
                self.improve_output = output;
                self.improve_loading = false;
                self.status = String::from("Done");
                Task::none()
            }
            Message::EnhanceFinished(Err(e)) => {
                self.improve_loading = false;
                self.fail("Error generating", e);
                Task::none()
            }
            Message::CopyOutput => clipboard::write(self.improve_output.clone()),
            Message::ReplaceSelection => {
                if self.improve_output.is_empty() {
                    self.status = String::from("No output to paste");
                    return Task::none();
                }
                let output = self.improve_output.clone();
                Task::future(async move {
                    let result =
                        tokio::task::spawn_blocking(move || selection::replace_selection(&output))
                            .await;
                    let flattened = match result {
                        Ok(inner) => inner.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    Message::SelectionReplaced(flattened)
                })
            }
            Message::SelectionReplaced(Ok(())) => {
                self.status = String::from("Selection replaced");
                Task::none()
            }
            Message::SelectionReplaced(Err(e)) => {
                self.fail("Error replacing selection", e);
                Task::none()
            }
            Message::EnhanceSelection => {
                if self.improve_loading {
                    return Task::none();
                }
                let Some(template) = self.picked_template() else {
                    return Task::none();
                };

                self.improve_loading = true;
                self.improve_output.clear();
                let client = self.client.clone();
                let model = self.config.model.clone();
                Task::future(async move {
                    let captured =
                        match tokio::task::spawn_blocking(selection::capture_selection).await {
                            Ok(Ok(Some(selected))) => selected,
                            Ok(Ok(None)) => {
                                return Message::EnhanceSelectionFinished(Err(String::from(
                                    "No text selected",
                                )))
                            }
                            Ok(Err(e)) => {
                                return Message::EnhanceSelectionFinished(Err(e.to_string()))
                            }
                            Err(e) => return Message::EnhanceSelectionFinished(Err(e.to_string())),
                        };

                    let prompt = template.fill(&captured);
                    let output = match client.lock().await.generate(&prompt, &model).await {
                        Ok(output) => output,
                        Err(e) => return Message::EnhanceSelectionFinished(Err(e.to_string())),
                    };

                    let pasted = {
                        let output = output.clone();
                        tokio::task::spawn_blocking(move || selection::replace_selection(&output))
                            .await
                    };
                    match pasted {
                        Ok(Ok(())) => Message::EnhanceSelectionFinished(Ok(output)),
                        Ok(Err(e)) => Message::EnhanceSelectionFinished(Err(e.to_string())),
                        Err(e) => Message::EnhanceSelectionFinished(Err(e.to_string())),
                    }
                })
            }
            Message::EnhanceSelectionFinished(Ok(output)) => {
                self.improve_output = output;
                self.improve_loading = false;
                self.status = String::from("Selection enhanced and replaced");
                Task::none()
            }
            Message::EnhanceSelectionFinished(Err(e)) => {
                self.improve_loading = false;
                self.fail("Error enhancing selection", e);
                Task::none()
            }

            Message::ChatInputChanged(value) => {
                self.chat_input = value;
                Task::none()
            }
            Message::ChatSend => {
                let content = self.chat_input.trim().to_string();
                if content.is_empty() || self.chat_loading {
                    return Task::none();
                }
                self.chat_input.clear();
                self.persist_chat("user", &content);
                self.chat_messages.push(ChatMessage::user(content));
                self.chat_loading = true;

                let transcript = self.chat_messages.clone();
                let client = self.client.clone();
                let model = self.config.model.clone();
                Task::future(async move {
                    let result = client.lock().await.chat(&transcript, &model).await;
                    Message::ChatReplied(result.map_err(|e| e.to_string()))
                })
            }
            Message::ChatReplied(Ok(reply)) => {
                self.persist_chat("assistant", &reply);
                self.chat_messages.push(ChatMessage::assistant(reply));
                self.chat_loading = false;
                Task::none()
            }
            Message::ChatReplied(Err(e)) => {
                self.chat_loading = false;
                self.fail("Error sending chat", e);
                Task::none()
            }
            Message::NewConversation => {
                self.conversation_id = None;
                self.chat_messages.clear();
                self.status = String::from("New conversation");
                Task::none()
            }
            Message::DeleteConversation => {
                if let Some(id) = self.conversation_id.take() {
                    if let Err(e) = history::delete_conversation(id) {
                        self.fail("Error deleting conversation", e.to_string());
                    } else {
                        self.status = String::from("Conversation deleted");
                    }
                }
                self.chat_messages.clear();
                Task::none()
            }

            Message::EditorPromptPicked(name) => {
                if let Some(body) = self.registry.get(&name) {
                    self.editor_body = text_editor::Content::with_text(body);
                    self.editor_name = name.clone();
                    self.editor_selected = Some(name);
                }
                Task::none()
            }
            Message::EditorNameChanged(value) => {
                self.editor_name = value;
                Task::none()
            }
            Message::EditorBodyEdited(action) => {
                self.editor_body.perform(action);
                Task::none()
            }
            Message::EditorNew => {
                self.editor_selected = None;
                self.editor_name.clear();
                self.editor_body = text_editor::Content::new();
                Task::none()
            }
            Message::EditorSave => {
                let name = self.editor_name.clone();
                let body = self.editor_body.text();
                match self.registry.set(&name, &body) {
                    Ok(()) => {
                        self.editor_dirty = true;
                        self.editor_selected = Some(name.trim().to_string());
                        self.status = format!("Template saved: {}", name.trim());
                    }
                    Err(e) => self.fail("Cannot save template", e.to_string()),
                }
                Task::none()
            }
            Message::EditorDelete => {
                let name = self.editor_name.trim().to_string();
                if self.registry.delete(&name) {
                    self.editor_dirty = true;
                    self.editor_selected = None;
                    self.editor_name.clear();
                    self.editor_body = text_editor::Content::new();
                    self.status = format!("Template deleted: {}", name);
                } else {
                    self.status = format!("No such template: {}", name);
                }
                Task::none()
            }
            Message::EditorApply => {
                match self.registry.save() {
                    Ok(()) => {
                        self.editor_dirty = false;
                        self.status = String::from("Prompts saved to disk");
                    }
                    Err(e) => self.fail("Error saving prompts", e.to_string()),
                }
                Task::none()
            }

            Message::LogLevelPicked(level) => {
                self.log_level = level;
                Task::none()
            }
            Message::LogsClear => {
                logbuf::clear();
                Task::none()
            }
            Message::LogsSave => {
                match logbuf::save_to_file() {
                    Ok(path) => self.status = format!("Log saved to {}", path.display()),
                    Err(e) => self.fail("Error saving log", e.to_string()),
                }
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let spinner = if self.improve_loading || self.chat_loading {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let stats = time::every(Duration::from_secs(1)).map(|_| Message::StatsTick);

        Subscription::batch([spinner, stats])
    }

    fn view(&self) -> Element<Message> {
        let body: Element<Message> = match self.pane {
            Pane::Improve => self.view_improve(),
            Pane::Chat => self.view_chat(),
            Pane::Prompts => self.view_prompts(),
            Pane::Logs => self.view_logs(),
            Pane::Stats => self.view_stats(),
        };

        let content = column![self.top_bar(), self.tab_row(), body, text(&self.status).size(13)]
            .spacing(10)
            .padding(10);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn top_bar(&self) -> Element<Message> {
        let selected_model = (!self.config.model.is_empty()).then(|| self.config.model.clone());

        row![
            pick_list(
                &BackendKind::ALL[..],
                Some(self.config.backend),
                Message::BackendPicked
            )
            .text_size(14),
            pick_list(self.models.clone(), selected_model, Message::ModelPicked)
                .placeholder("no models")
                .text_size(14)
                .width(Length::Fill),
            button(text("Refresh").size(14)).on_press(Message::RefreshModels),
        ]
        .spacing(10)
        .into()
    }

    fn tab_row(&self) -> Element<Message> {
        let mut tabs = row![].spacing(6);
        for pane in Pane::ALL {
            let label = if self.pane == pane {
                format!("[{}]", pane.label())
            } else {
                format!(" {} ", pane.label())
            };
            tabs = tabs.push(button(text(label).size(14)).on_press(Message::PaneSelected(pane)));
        }
        tabs.into()
    }

    fn view_improve(&self) -> Element<Message> {
        let controls = row![
            pick_list(
                self.prompt_names(),
                self.improve_prompt.clone(),
                Message::ImprovePromptPicked
            )
            .placeholder("pick a template")
            .text_size(14)
            .width(Length::Fill),
            button(text("Grab selection").size(14)).on_press(Message::GrabSelection),
            button(text("Enhance").size(14)).on_press(Message::Enhance),
            button(text("Enhance selection").size(14)).on_press(Message::EnhanceSelection),
        ]
        .spacing(8);

        let input = text_editor(&self.improve_input)
            .on_action(Message::ImproveInputEdited)
            .height(Length::Fixed(150.0));

        let output: Element<Message> = if self.improve_loading {
            self.loading_view()
        } else {
            scrollable(
                container(text(self.improve_output.clone()).size(15))
                    .padding(10)
                    .width(Length::Fill),
            )
            .height(Length::Fill)
            .into()
        };

        let actions = row![
            button(text("Copy output").size(14)).on_press(Message::CopyOutput),
            button(text("Replace selection").size(14)).on_press(Message::ReplaceSelection),
        ]
        .spacing(8);

        column![controls, input, output, actions].spacing(10).into()
    }

    fn view_chat(&self) -> Element<Message> {
        let mut transcript = column![].spacing(8);
        for message in &self.chat_messages {
            let speaker = if message.role == "assistant" { "assistant" } else { "you" };
            transcript =
                transcript.push(text(format!("{}> {}", speaker, message.content)).size(15));
        }
        if self.chat_loading {
            let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            transcript = transcript.push(
                text(format!("assistant> {}", frames[self.loading_frame % frames.len()])).size(15),
            );
        }

        let input = text_input("Type your message...", &self.chat_input)
            .on_input(Message::ChatInputChanged)
            .on_submit(Message::ChatSend)
            .padding(10)
            .size(15);

        let controls = row![
            input,
            button(text("Send").size(14)).on_press(Message::ChatSend),
            button(text("New").size(14)).on_press(Message::NewConversation),
            button(text("Delete").size(14)).on_press(Message::DeleteConversation),
        ]
        .spacing(8);

        column![
            scrollable(container(transcript).padding(10).width(Length::Fill))
                .height(Length::Fill),
            controls,
        ]
        .spacing(10)
        .into()
    }

    fn view_prompts(&self) -> Element<Message> {
        let picker = pick_list(
            self.prompt_names(),
            self.editor_selected.clone(),
            Message::EditorPromptPicked,
        )
        .placeholder("pick a template")
        .text_size(14)
        .width(Length::Fill);

        let name_input = text_input("Template name", &self.editor_name)
            .on_input(Message::EditorNameChanged)
            .padding(8)
            .size(15);

        let body_editor = text_editor(&self.editor_body)
            .on_action(Message::EditorBodyEdited)
            .height(Length::Fill);

        let mut actions = row![
            button(text("New").size(14)).on_press(Message::EditorNew),
            button(text("Save").size(14)).on_press(Message::EditorSave),
            button(text("Delete").size(14)).on_press(Message::EditorDelete),
            button(text("Apply changes").size(14)).on_press(Message::EditorApply),
        ]
        .spacing(8);
        if self.editor_dirty {
            actions = actions.push(text("unsaved changes").size(14));
        }

        column![
            picker,
            name_input,
            text("The body must contain {text} where the input goes.").size(13),
            body_editor,
            actions,
        ]
        .spacing(10)
        .into()
    }

    fn view_logs(&self) -> Element<Message> {
        let controls = row![
            pick_list(
                &logbuf::Level::ALL[..],
                Some(self.log_level),
                Message::LogLevelPicked
            )
            .text_size(14),
            button(text("Clear").size(14)).on_press(Message::LogsClear),
            button(text("Save to file").size(14)).on_press(Message::LogsSave),
        ]
        .spacing(8);

        let mut lines = column![].spacing(2);
        for entry in logbuf::recent(200, self.log_level) {
            lines = lines.push(text(format!("{} - {}", entry.level, entry.text)).size(13));
        }

        column![
            controls,
            scrollable(container(lines).padding(10).width(Length::Fill)).height(Length::Fill),
        ]
        .spacing(10)
        .into()
    }

    fn view_stats(&self) -> Element<Message> {
        let stats = &self.stats;
        let total = stats.success_count + stats.failed_count;

        column![
            text(format!(
                "Requests: {} ({} ok, {} failed)",
                total, stats.success_count, stats.failed_count
            ))
            .size(15),
            text(format!(
                "Latency: min {:.2}s / avg {:.2}s / max {:.2}s",
                stats.min_response_time, stats.avg_response_time, stats.max_response_time
            ))
            .size(15),
            text(format!(
                "Tokens: {} sent, {} received",
                stats.tokens_sent, stats.tokens_received
            ))
            .size(15),
            text(format!(
                "CPU: {:.1}%  Memory: {} MB",
                stats.cpu_percent, stats.memory_used_mb
            ))
            .size(15),
        ]
        .spacing(6)
        .height(Length::Fill)
        .into()
    }

    fn loading_view(&self) -> Element<Message> {
        let loading_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let loading_messages = [
            "Consulting the local model...",
            "Polishing your prose...",
            "Rearranging the words...",
            "Brewing up an answer...",
            "Thinking really hard...",
            "Weighing every token...",
            "Calculating probabilities...",
            "Almost there...",
        ];

        let message_idx = (self.loading_frame / 10) % loading_messages.len();
        let spinner_idx = self.loading_frame % loading_frames.len();

        container(
            column![
                text(loading_frames[spinner_idx]).size(32),
                text(loading_messages[message_idx]).size(15)
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

fn restore_latest_conversation() -> (Option<i64>, Vec<ChatMessage>) {
    match history::latest_conversation() {
        Ok(Some(id)) => match history::messages(id) {
            Ok(stored) => {
                let messages = stored
                    .into_iter()
                    .map(|m| ChatMessage { role: m.role, content: m.content })
                    .collect();
                (Some(id), messages)
            }
            Err(e) => {
                logbuf::log_with(
                    logbuf::Level::Error,
                    format!("Error loading chat history: {}", e),
                );
                (Some(id), Vec::new())
            }
        },
        Ok(None) => (None, Vec::new()),
        Err(e) => {
            logbuf::log_with(
                logbuf::Level::Error,
                format!("Error loading chat history: {}", e),
            );
            (None, Vec::new())
        }
    }
}
