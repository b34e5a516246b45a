use crate::clipboard::LocalStorageClipboard;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardItem, CardList, CardTitle, Input, Spinner,
};
use crate::document;
use crate::editor::{EditorSession, SaveStatus};
use crate::models::{Block, BlockData, BlockType, ColumnsContent};
use crate::sanitize::{sanitize_html, sanitize_url};
use crate::state::AppContext;
use icons::{ChevronDown, ChevronUp, X};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::params::Params;
use std::sync::Arc;
use strum::IntoEnumIterator;

#[component]
pub fn HomePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let pages = app_state.0.pages;
    let pages_loading = app_state.0.pages_loading;
    let pages_error = app_state.0.pages_error;
    let pages_request_id = app_state.0.pages_request_id;

    let load_pages = move || {
        let client = api_client.get_untracked();
        // Request id guards against a slow response landing after a refresh.
        let req_id = pages_request_id.get_untracked() + 1;
        pages_request_id.set(req_id);
        pages_loading.set(true);
        pages_error.set(None);

        spawn_local(async move {
            let result = client.get_page_list().await;
            if pages_request_id.get_untracked() != req_id {
                return;
            }
            match result {
                Ok(list) => pages.set(list),
                Err(e) => pages_error.set(Some(e.to_string())),
            }
            pages_loading.set(false);
        });
    };

    Effect::new(move |_| {
        load_pages();
    });

    let create_title: RwSignal<String> = RwSignal::new(String::new());
    let creating: RwSignal<bool> = RwSignal::new(false);

    let on_create = move |_| {
        let raw = create_title.get_untracked();
        let title = if raw.trim().is_empty() {
            "Untitled page".to_string()
        } else {
            raw.trim().to_string()
        };
        let client = api_client.get_untracked();
        creating.set(true);
        pages_error.set(None);

        spawn_local(async move {
            match client.create_page(&title).await {
                Ok(page) => {
                    let _ = window()
                        .location()
                        .set_href(&format!("/page/{}", urlencoding::encode(&page.id)));
                }
                Err(e) => pages_error.set(Some(e.to_string())),
            }
            creating.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[880px] px-4 py-8">
                <div class="mb-4 flex items-center justify-between">
                    <div class="space-y-1">
                        <h1 class="text-xl font-semibold">"Pagecraft"</h1>
                        <p class="text-xs text-muted-foreground">"Pages"</p>
                    </div>

                    <Button
                        variant=ButtonVariant::Outline
                        attr:disabled=move || pages_loading.get()
                        on:click=move |_| load_pages()
                    >
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || pages_loading.get() fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            {move || if pages_loading.get() { "Refreshing" } else { "Refresh" }}
                        </span>
                    </Button>
                </div>

                <Show when=move || pages_error.get().is_some() fallback=|| ().into_view()>
                    {move || {
                        pages_error.get().map(|e| view! {
                            <Alert class="mb-4 border-destructive/30">
                                <AlertDescription class="text-destructive">{e}</AlertDescription>
                            </Alert>
                        })
                    }}
                </Show>

                <Card class="mb-6">
                    <CardHeader>
                        <CardTitle>"New page"</CardTitle>
                    </CardHeader>
                    <CardContent>
                        <div class="flex items-center gap-2">
                            <Input placeholder="Page title" bind_value=create_title />
                            <Button attr:disabled=move || creating.get() on:click=on_create>
                                {move || if creating.get() { "Creating..." } else { "Create" }}
                            </Button>
                        </div>
                    </CardContent>
                </Card>

                <Card>
                    <CardHeader>
                        <CardTitle>"Pages"</CardTitle>
                        <CardDescription>
                            {move || format!("{} total", pages.get().len())}
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        <Show
                            when=move || !pages.get().is_empty()
                            fallback=move || view! {
                                <div class="text-xs text-muted-foreground">
                                    {move || if pages_loading.get() {
                                        "Loading pages..."
                                    } else {
                                        "No pages yet."
                                    }}
                                </div>
                            }
                        >
                            <CardList>
                                {move || {
                                    pages
                                        .get()
                                        .into_iter()
                                        .map(|p| {
                                            let href = format!("/page/{}", urlencoding::encode(&p.id));
                                            view! {
                                                <CardItem class="rounded-md border">
                                                    <a class="flex w-full flex-col items-start gap-1 px-4 py-3" href=href>
                                                        <span class="text-sm font-medium">{p.title}</span>
                                                        <span class="text-xs text-muted-foreground">
                                                            {format!("/{} · updated {}", p.slug, p.updated_at)}
                                                        </span>
                                                    </a>
                                                </CardItem>
                                            }
                                        })
                                        .collect_view()
                                }}
                            </CardList>
                        </Show>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct PageRouteParams {
    pub page_id: Option<String>,
}

#[component]
pub fn EditorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = leptos_router::hooks::use_params::<PageRouteParams>();

    let session = StoredValue::new(EditorSession::new(
        app_state,
        Arc::new(LocalStorageClipboard),
    ));

    let blocks = session.with_value(|s| s.blocks);
    let selected = session.with_value(|s| s.selected_id);
    let meta = session.with_value(|s| s.meta);
    let status = session.with_value(|s| s.status);
    let save_error = session.with_value(|s| s.save_error);
    let conflict = session.with_value(|s| s.conflict);
    let loading = session.with_value(|s| s.loading);
    let load_error = session.with_value(|s| s.load_error);
    let session_page_id = session.with_value(|s| s.page_id);

    let route_page_id = move || params.get().ok().and_then(|p| p.page_id).unwrap_or_default();

    Effect::new(move |_| {
        let id = route_page_id();
        if id.trim().is_empty() {
            return;
        }
        if session_page_id.get_untracked() != id {
            session.with_value(|s| s.load_page(id));
        }
    });

    // Ctrl/Cmd+Z undoes, with Shift (or Ctrl+Y) redoes.
    let keydown = window_event_listener(ev::keydown, move |ev| {
        if !(ev.ctrl_key() || ev.meta_key()) {
            return;
        }
        match ev.key().as_str() {
            "z" | "Z" => {
                ev.prevent_default();
                if ev.shift_key() {
                    session.with_value(|s| s.redo());
                } else {
                    session.with_value(|s| s.undo());
                }
            }
            "y" | "Y" => {
                ev.prevent_default();
                session.with_value(|s| s.redo());
            }
            _ => {}
        }
    });
    on_cleanup(move || keydown.remove());

    let status_dot = move || match status.get() {
        SaveStatus::Clean => "bg-emerald-500",
        SaveStatus::Dirty => "bg-amber-500",
        SaveStatus::Saving => "bg-sky-500 animate-pulse",
        SaveStatus::Error => "bg-destructive",
        SaveStatus::Conflict => "bg-destructive",
    };

    let title_value = move || meta.get().title;

    view! {
        <div class="min-h-screen bg-background">
            <div class="sticky top-0 z-10 border-b bg-background/95 backdrop-blur">
                <div class="mx-auto flex w-full max-w-[1200px] items-center gap-3 px-4 py-2">
                    <a class="text-sm font-medium text-muted-foreground hover:text-foreground" href="/">
                        "Pages"
                    </a>

                    <input
                        class="h-8 w-64 rounded-md border border-transparent bg-transparent px-2 text-sm font-medium outline-none hover:border-input focus:border-input"
                        placeholder="Page title"
                        prop:value=title_value
                        on:input=move |ev| {
                            let v = event_target_value(&ev);
                            session.with_value(|s| s.update_meta(|m| m.title = v));
                        }
                    />

                    <div class="ml-auto flex items-center gap-2">
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Sm
                            attr:disabled=move || !session.with_value(|s| s.can_undo())
                            on:click=move |_| session.with_value(|s| s.undo())
                        >
                            "Undo"
                        </Button>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Sm
                            attr:disabled=move || !session.with_value(|s| s.can_redo())
                            on:click=move |_| session.with_value(|s| s.redo())
                        >
                            "Redo"
                        </Button>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Sm
                            on:click=move |_| session.with_value(|s| s.paste_block())
                        >
                            "Paste"
                        </Button>

                        <div class="flex items-center gap-1.5 rounded-md border px-2 py-1">
                            <span class=move || format!("size-2 rounded-full {}", status_dot())></span>
                            <span class="text-xs text-muted-foreground">
                                {move || status.get().label()}
                            </span>
                        </div>

                        <Button
                            size=ButtonSize::Sm
                            attr:disabled=move || status.get() == SaveStatus::Conflict
                            on:click=move |_| session.with_value(|s| s.save())
                        >
                            "Save now"
                        </Button>
                    </div>
                </div>
            </div>

            <div class="mx-auto flex w-full max-w-[1200px] gap-6 px-4 py-6">
                <div class="min-w-0 flex-1">
                    <Show when=move || conflict.get().is_some() fallback=|| ().into_view()>
                        {move || {
                            conflict.get().map(|c| view! {
                                <Alert class="mb-4 border-destructive/30">
                                    <AlertDescription>
                                        <div class="flex flex-col gap-2">
                                            <span class="text-destructive">
                                                {format!(
                                                    "Someone else saved this page at {}. Saving is paused until you choose a version.",
                                                    c.server_updated_at
                                                )}
                                            </span>
                                            <div class="flex gap-2">
                                                <Button size=ButtonSize::Sm on:click=move |_| session.with_value(|s| s.resolve_keep_local())>
                                                    "Keep my version"
                                                </Button>
                                                <Button
                                                    size=ButtonSize::Sm
                                                    variant=ButtonVariant::Outline
                                                    on:click=move |_| session.with_value(|s| s.resolve_load_server())
                                                >
                                                    "Load server version"
                                                </Button>
                                            </div>
                                        </div>
                                    </AlertDescription>
                                </Alert>
                            })
                        }}
                    </Show>

                    <Show when=move || save_error.get().is_some() fallback=|| ().into_view()>
                        {move || {
                            save_error.get().map(|e| view! {
                                <Alert class="mb-4 border-destructive/30">
                                    <AlertDescription>
                                        <div class="flex items-center justify-between gap-3">
                                            <span class="text-destructive">{format!("Save failed: {e}")}</span>
                                            <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=move |_| session.with_value(|s| s.save())>
                                                "Retry"
                                            </Button>
                                        </div>
                                    </AlertDescription>
                                </Alert>
                            })
                        }}
                    </Show>

                    <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                        {move || {
                            load_error.get().map(|e| view! {
                                <Alert class="mb-4 border-destructive/30">
                                    <AlertDescription class="text-destructive">{e}</AlertDescription>
                                </Alert>
                            })
                        }}
                    </Show>

                    <Show
                        when=move || !loading.get()
                        fallback=move || view! {
                            <div class="flex items-center gap-2 py-12 text-sm text-muted-foreground">
                                <Spinner />
                                "Loading page..."
                            </div>
                        }
                    >
                        <div class="flex flex-col gap-3">
                            {move || {
                                let list = blocks.get();
                                let len = list.len();
                                list.into_iter()
                                    .enumerate()
                                    .map(|(index, block)| view! { <CanvasBlock session block index len /> })
                                    .collect_view()
                            }}
                            <Show when=move || blocks.get().is_empty() fallback=|| ().into_view()>
                                <div class="rounded-lg border border-dashed py-12 text-center text-sm text-muted-foreground">
                                    "Empty page. Add a block from the palette."
                                </div>
                            </Show>
                        </div>
                    </Show>
                </div>

                <div class="w-72 shrink-0">
                    <div class="sticky top-16 flex flex-col gap-4">
                        <BlockPalette session />

                        {move || {
                            let sel = selected.get()?;
                            let tree = blocks.get();
                            let block = document::find_anywhere(&tree, &sel)?.clone();
                            Some(view! { <BlockInspector session block /> })
                        }}

                        <PageSettings session />
                    </div>
                </div>
            </div>
        </div>
    }
}

#[component]
fn BlockPalette(session: StoredValue<EditorSession>) -> impl IntoView {
    view! {
        <Card class="py-4">
            <CardHeader class="px-4">
                <CardTitle class="text-sm">"Add block"</CardTitle>
            </CardHeader>
            <CardContent class="px-4">
                <div class="grid grid-cols-3 gap-1.5">
                    {BlockType::iter()
                        .map(|kind| {
                            view! {
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    class="w-full capitalize"
                                    on:click=move |_| session.with_value(|s| s.add_block(kind, None))
                                >
                                    {kind.to_string()}
                                </Button>
                            }
                        })
                        .collect_view()}
                </div>
            </CardContent>
        </Card>
    }
}

#[component]
fn PageSettings(session: StoredValue<EditorSession>) -> impl IntoView {
    let meta = session.with_value(|s| s.meta);

    view! {
        <Card class="py-4">
            <CardHeader class="px-4">
                <CardTitle class="text-sm">"Page settings"</CardTitle>
            </CardHeader>
            <CardContent class="px-4">
                <div class="flex flex-col gap-2">
                    <label class="text-xs text-muted-foreground">"Slug"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=move || meta.get().slug
                        on:input=move |ev| {
                            let v = event_target_value(&ev);
                            session.with_value(|s| s.update_meta(|m| m.slug = v));
                        }
                    />
                    <label class="text-xs text-muted-foreground">"Description"</label>
                    <textarea
                        class="rounded-md border border-input bg-transparent px-2 py-1 text-sm outline-none focus:border-ring"
                        rows=3
                        prop:value=move || meta.get().description
                        on:input=move |ev| {
                            let v = event_target_value(&ev);
                            session.with_value(|s| s.update_meta(|m| m.description = v));
                        }
                    ></textarea>
                    <label class="flex items-center gap-2 text-xs text-muted-foreground">
                        <input
                            r#type="checkbox"
                            prop:checked=move || meta.get().noindex
                            on:change=move |ev| {
                                let v = event_target_checked(&ev);
                                session.with_value(|s| s.update_meta(|m| m.noindex = v));
                            }
                        />
                        "Hide from search engines"
                    </label>
                </div>
            </CardContent>
        </Card>
    }
}

#[component]
fn CanvasBlock(
    session: StoredValue<EditorSession>,
    block: Block,
    index: usize,
    len: usize,
) -> impl IntoView {
    let id = block.id.clone();
    let kind = block.kind();
    let hidden = block.settings.hidden();
    let selected = session.with_value(|s| s.selected_id);
    let exiting = session.with_value(|s| s.exiting_ids);

    let id_sv = StoredValue::new(id.clone());
    let is_selected = move || selected.get() == Some(id_sv.get_value());
    let is_exiting = move || exiting.get().contains(&id_sv.get_value());

    let dup_id = id.clone();
    let copy_id = id.clone();
    let remove_id = id.clone();

    let body = match &block.data {
        BlockData::Columns(c) => columns_editor(session, &id, c),
        _ => block_preview(&block),
    };

    view! {
        <div
            class="group relative rounded-lg border bg-card p-4 transition-opacity"
            class=("ring-2", is_selected)
            class=("ring-ring", is_selected)
            class=("opacity-30", is_exiting)
            on:click=move |_| session.with_value(|s| s.selected_id.set(Some(id_sv.get_value())))
        >
            <div class="absolute -top-3 right-2 hidden items-center gap-1 rounded-md border bg-background px-1 py-0.5 shadow-sm group-hover:flex">
                <span class="px-1 text-[10px] uppercase text-muted-foreground">{kind.to_string()}</span>
                <Show when=move || hidden fallback=|| ().into_view()>
                    <span class="rounded bg-muted px-1 text-[10px] text-muted-foreground">"hidden"</span>
                </Show>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:disabled=move || index == 0
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| s.move_block(index, index.saturating_sub(1)));
                    }
                >
                    <ChevronUp class="size-3.5" />
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:disabled=move || { index + 1 >= len }
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| s.move_block(index, index + 1));
                    }
                >
                    <ChevronDown class="size-3.5" />
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| s.duplicate_block(&dup_id));
                    }
                >
                    "Dup"
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| s.copy_block(&copy_id));
                    }
                >
                    "Copy"
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| s.request_remove(&remove_id));
                    }
                >
                    <X class="size-3.5" />
                </Button>
            </div>

            <div class=("opacity-50", move || hidden)>{body}</div>
        </div>
    }
}

/// Nesting is capped at one level, so column children never branch back into
/// the columns editor.
#[component]
fn ColumnChildBlock(
    session: StoredValue<EditorSession>,
    columns_id: String,
    slot_index: usize,
    block: Block,
    index: usize,
    len: usize,
) -> impl IntoView {
    let id = block.id.clone();
    let selected = session.with_value(|s| s.selected_id);
    let exiting = session.with_value(|s| s.exiting_ids);

    let id_sv = StoredValue::new(id.clone());
    let is_selected = move || selected.get() == Some(id_sv.get_value());
    let is_exiting = move || exiting.get().contains(&id_sv.get_value());

    let remove_id = id;
    let cid_up = columns_id.clone();
    let cid_down = columns_id;

    let body = block_preview(&block);

    view! {
        <div
            class="group/col relative rounded-md border bg-background p-2 transition-opacity"
            class=("ring-2", is_selected)
            class=("ring-ring", is_selected)
            class=("opacity-30", is_exiting)
            on:click=move |ev| {
                ev.stop_propagation();
                session.with_value(|s| s.selected_id.set(Some(id_sv.get_value())));
            }
        >
            <div class="absolute -top-2.5 right-1 hidden items-center gap-0.5 rounded border bg-background px-0.5 shadow-sm group-hover/col:flex">
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:disabled=move || index == 0
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| {
                            s.move_block_in_column(&cid_up, slot_index, index, index.saturating_sub(1))
                        });
                    }
                >
                    <ChevronUp class="size-3" />
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:disabled=move || { index + 1 >= len }
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| {
                            s.move_block_in_column(&cid_down, slot_index, index, index + 1)
                        });
                    }
                >
                    <ChevronDown class="size-3" />
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    on:click=move |ev| {
                        ev.stop_propagation();
                        session.with_value(|s| s.request_remove(&remove_id));
                    }
                >
                    <X class="size-3" />
                </Button>
            </div>

            {body}
        </div>
    }
}

fn columns_editor(
    session: StoredValue<EditorSession>,
    columns_id: &str,
    content: &ColumnsContent,
) -> AnyView {
    let columns_id = columns_id.to_string();
    let slots = content.columns.clone();
    let n = slots.len().max(1);

    view! {
        <div
            class="grid gap-3"
            style=format!("grid-template-columns: repeat({n}, minmax(0, 1fr));")
        >
            {slots
                .into_iter()
                .enumerate()
                .map(|(slot_index, slot)| {
                    let cid = columns_id.clone();
                    let insert_cid = columns_id.clone();
                    let len = slot.blocks.len();
                    view! {
                        <div class="flex min-h-16 flex-col gap-2 rounded-md border border-dashed p-2">
                            {slot
                                .blocks
                                .into_iter()
                                .enumerate()
                                .map(|(index, child)| {
                                    view! {
                                        <ColumnChildBlock
                                            session
                                            columns_id=cid.clone()
                                            slot_index
                                            block=child
                                            index
                                            len
                                        />
                                    }
                                })
                                .collect_view()}
                            <SlotInsert session columns_id=insert_cid slot_index />
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
    .into_any()
}

#[component]
fn SlotInsert(
    session: StoredValue<EditorSession>,
    columns_id: String,
    slot_index: usize,
) -> impl IntoView {
    let on_change = move |ev: web_sys::Event| {
        let v = event_target_value(&ev);
        if let Some(kind) = BlockType::iter().find(|k| k.to_string() == v) {
            session.with_value(|s| s.add_block_in_column(&columns_id, slot_index, kind, None));
        }
    };

    view! {
        <select
            class="h-7 rounded-md border border-input bg-transparent px-1 text-xs text-muted-foreground outline-none"
            prop:value=""
            on:change=on_change
        >
            <option value="">"Add block..."</option>
            {BlockType::iter()
                .filter(|k| *k != BlockType::Columns)
                .map(|k| view! { <option value=k.to_string() class="capitalize">{k.to_string()}</option> })
                .collect_view()}
        </select>
    }
}

/// Embedded HTML cleaned again at render time. A loaded document (or one
/// adopted from a conflict) may carry content another client never sanitized.
fn display_html(html: &str) -> String {
    sanitize_html(html)
}

/// Render-time counterpart for URL fields; rejected schemes become empty.
fn display_src(url: &str) -> String {
    sanitize_url(url)
}

fn block_preview(block: &Block) -> AnyView {
    match &block.data {
        BlockData::Heading(h) => {
            let class = match h.level {
                1 => "text-3xl font-bold",
                2 => "text-2xl font-semibold",
                3 => "text-xl font-semibold",
                _ => "text-lg font-medium",
            };
            view! { <div class=class>{h.text.clone()}</div> }.into_any()
        }
        BlockData::Text(t) => {
            view! { <div class="text-sm leading-relaxed" inner_html=display_html(&t.html)></div> }
                .into_any()
        }
        BlockData::Image(i) => {
            let src = display_src(&i.src);
            if src.is_empty() {
                placeholder("Image: no source set")
            } else {
                let caption = i.caption.clone();
                view! {
                    <figure>
                        <img class="max-w-full rounded-md" src=src alt=i.alt.clone() />
                        <Show when={
                            let has_caption = !i.caption.trim().is_empty();
                            move || has_caption
                        } fallback=|| ().into_view()>
                            <figcaption class="mt-1 text-xs text-muted-foreground">
                                {caption.clone()}
                            </figcaption>
                        </Show>
                    </figure>
                }
                .into_any()
            }
        }
        BlockData::Button(b) => view! {
            <span class="inline-flex h-9 items-center rounded-md bg-primary px-4 text-sm font-medium text-primary-foreground">
                {b.label.clone()}
            </span>
        }
        .into_any(),
        BlockData::Spacer(s) => view! {
            <div class="rounded bg-muted/40" style=format!("height: {}px;", s.height)></div>
        }
        .into_any(),
        BlockData::Divider(_) => view! { <hr class="border-border" /> }.into_any(),
        BlockData::Columns(_) => placeholder("Columns"),
        BlockData::Video(v) => {
            if v.url.trim().is_empty() {
                placeholder("Video: no URL set")
            } else {
                placeholder(&format!("Video: {}", v.url))
            }
        }
        BlockData::Quote(q) => {
            let attribution = format!("~ {}", q.attribution);
            view! {
                <blockquote class="border-l-2 pl-3 text-sm italic">
                    {q.text.clone()}
                    <Show when={
                        let has_attr = !q.attribution.trim().is_empty();
                        move || has_attr
                    } fallback=|| ().into_view()>
                        <footer class="mt-1 text-xs not-italic text-muted-foreground">
                            {attribution.clone()}
                        </footer>
                    </Show>
                </blockquote>
            }
            .into_any()
        }
        BlockData::Form(f) => view! {
            <div class="flex flex-col gap-1.5">
                {f.fields
                    .iter()
                    .map(|field| view! {
                        <div class="flex items-center gap-2 text-xs text-muted-foreground">
                            <span>{field.label.clone()}</span>
                            <span class="rounded bg-muted px-1">{field.kind.clone()}</span>
                        </div>
                    })
                    .collect_view()}
                <span class="mt-1 inline-flex h-8 w-fit items-center rounded-md bg-primary px-3 text-xs font-medium text-primary-foreground">
                    {f.submit_label.clone()}
                </span>
            </div>
        }
        .into_any(),
        BlockData::Code(c) => view! {
            <pre class="overflow-x-auto rounded-md bg-muted p-3 text-xs"><code>{c.code.clone()}</code></pre>
        }
        .into_any(),
        BlockData::Social(s) => {
            if s.links.is_empty() {
                placeholder("Social links: none configured")
            } else {
                view! {
                    <div class="flex gap-2 text-xs text-muted-foreground">
                        {s.links
                            .iter()
                            .map(|l| view! { <span class="rounded bg-muted px-2 py-1">{l.network.clone()}</span> })
                            .collect_view()}
                    </div>
                }
                .into_any()
            }
        }
        BlockData::Accordion(a) => view! {
            <div class="flex flex-col gap-1">
                {a.items
                    .iter()
                    .map(|item| view! {
                        <div class="rounded-md border px-3 py-2 text-sm font-medium">{item.title.clone()}</div>
                    })
                    .collect_view()}
            </div>
        }
        .into_any(),
        BlockData::Table(t) => view! {
            <table class="w-full text-left text-xs">
                <thead>
                    <tr>
                        {t.header
                            .iter()
                            .map(|h| view! { <th class="border-b px-2 py-1 font-medium">{h.clone()}</th> })
                            .collect_view()}
                    </tr>
                </thead>
                <tbody>
                    {t.rows
                        .iter()
                        .map(|row| view! {
                            <tr>
                                {row.iter()
                                    .map(|cell| view! { <td class="border-b px-2 py-1 text-muted-foreground">{cell.clone()}</td> })
                                    .collect_view()}
                            </tr>
                        })
                        .collect_view()}
                </tbody>
            </table>
        }
        .into_any(),
        BlockData::Toc(t) => placeholder(&format!("Table of contents (headings up to H{})", t.max_level)),
    }
}

fn placeholder(text: &str) -> AnyView {
    let text = text.to_string();
    view! {
        <div class="rounded-md border border-dashed px-3 py-4 text-center text-xs text-muted-foreground">
            {text}
        </div>
    }
    .into_any()
}

#[component]
fn BlockInspector(session: StoredValue<EditorSession>, block: Block) -> impl IntoView {
    let id = StoredValue::new(block.id.clone());
    let kind = block.kind();
    let hidden = block.settings.hidden();
    let align = block
        .settings
        .values
        .get("align")
        .and_then(|v| v.as_str())
        .unwrap_or("left")
        .to_string();

    let patch = move |value: serde_json::Value| {
        session.with_value(|s| s.update_content(&id.get_value(), value));
    };
    let patch_settings = move |value: serde_json::Value| {
        session.with_value(|s| s.update_settings(&id.get_value(), value));
    };

    let fields = inspector_fields(session, id, patch, &block.data);

    view! {
        <Card class="py-4">
            <CardHeader class="px-4">
                <CardTitle class="text-sm capitalize">{format!("{kind} block")}</CardTitle>
            </CardHeader>
            <CardContent class="px-4">
                <div class="flex flex-col gap-3">
                    {fields}

                    <div class="flex flex-col gap-1.5">
                        <label class="text-xs text-muted-foreground">"Alignment"</label>
                        <div class="flex gap-1">
                            {["left", "center", "right"]
                                .into_iter()
                                .map(|a| {
                                    let current = align.clone();
                                    let variant = if current == a {
                                        ButtonVariant::Default
                                    } else {
                                        ButtonVariant::Outline
                                    };
                                    view! {
                                        <Button
                                            variant=variant
                                            size=ButtonSize::Sm
                                            on:click=move |_| patch_settings(serde_json::json!({"align": a}))
                                        >
                                            {a}
                                        </Button>
                                    }
                                })
                                .collect_view()}
                        </div>
                    </div>

                    <label class="flex items-center gap-2 text-xs text-muted-foreground">
                        <input
                            r#type="checkbox"
                            prop:checked=hidden
                            on:change=move |_| patch_settings(serde_json::json!({"hidden": !hidden}))
                        />
                        "Hidden on published page"
                    </label>
                </div>
            </CardContent>
        </Card>
    }
}

/// Per-kind content fields. Patch keys mirror the camelCase wire names of the
/// content structs.
fn inspector_fields(
    session: StoredValue<EditorSession>,
    id: StoredValue<String>,
    patch: impl Fn(serde_json::Value) + Copy + 'static,
    data: &BlockData,
) -> AnyView {
    match data {
        BlockData::Heading(h) => {
            let text = h.text.clone();
            let level = h.level;
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Text"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=text
                        on:input=move |ev| patch(serde_json::json!({"text": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Level"</label>
                    <div class="flex gap-1">
                        {(1u8..=4)
                            .map(|n| {
                                let variant = if level == n {
                                    ButtonVariant::Default
                                } else {
                                    ButtonVariant::Outline
                                };
                                view! {
                                    <Button
                                        variant=variant
                                        size=ButtonSize::Sm
                                        on:click=move |_| patch(serde_json::json!({"level": n}))
                                    >
                                        {format!("H{n}")}
                                    </Button>
                                }
                            })
                            .collect_view()}
                    </div>
                </div>
            }
            .into_any()
        }
        BlockData::Text(t) => {
            let html = t.html.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"HTML"</label>
                    <textarea
                        class="rounded-md border border-input bg-transparent px-2 py-1 font-mono text-xs outline-none focus:border-ring"
                        rows=6
                        prop:value=html
                        on:input=move |ev| patch(serde_json::json!({"html": event_target_value(&ev)}))
                    ></textarea>
                </div>
            }
            .into_any()
        }
        BlockData::Image(i) => {
            let src = i.src.clone();
            let alt = i.alt.clone();
            let caption = i.caption.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Source URL"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=src
                        on:input=move |ev| patch(serde_json::json!({"src": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Alt text"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=alt
                        on:input=move |ev| patch(serde_json::json!({"alt": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Caption"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=caption
                        on:input=move |ev| patch(serde_json::json!({"caption": event_target_value(&ev)}))
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Button(b) => {
            let label = b.label.clone();
            let href = b.href.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Label"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=label
                        on:input=move |ev| patch(serde_json::json!({"label": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Link"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=href
                        on:input=move |ev| patch(serde_json::json!({"href": event_target_value(&ev)}))
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Spacer(s) => {
            let height = s.height;
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Height (px)"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        r#type="number"
                        prop:value=height.to_string()
                        on:input=move |ev| {
                            if let Ok(h) = event_target_value(&ev).parse::<u32>() {
                                patch(serde_json::json!({"height": h}));
                            }
                        }
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Columns(c) => {
            let count = c.columns.len();
            let columns_id = id.get_value();
            let widths = c
                .column_widths
                .as_ref()
                .map(|w| {
                    w.iter()
                        .map(|x| x.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            let widths_cid = columns_id.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Columns"</label>
                    <div class="flex gap-1">
                        {(1usize..=4)
                            .map(|n| {
                                let cid = columns_id.clone();
                                let variant = if count == n {
                                    ButtonVariant::Default
                                } else {
                                    ButtonVariant::Outline
                                };
                                view! {
                                    <Button
                                        variant=variant
                                        size=ButtonSize::Sm
                                        on:click=move |_| session.with_value(|s| s.set_column_count(&cid, n))
                                    >
                                        {n.to_string()}
                                    </Button>
                                }
                            })
                            .collect_view()}
                    </div>
                    <label class="text-xs text-muted-foreground">"Widths (fractions, comma separated)"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        placeholder="0.3, 0.7"
                        prop:value=widths
                        on:change=move |ev| {
                            let parsed: Vec<f32> = event_target_value(&ev)
                                .split(',')
                                .filter_map(|p| p.trim().parse::<f32>().ok())
                                .collect();
                            if !parsed.is_empty() {
                                session.with_value(|s| s.set_column_widths(&widths_cid, parsed.clone()));
                            }
                        }
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Video(v) => {
            let url = v.url.clone();
            let caption = v.caption.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Video URL"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=url
                        on:input=move |ev| patch(serde_json::json!({"url": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Caption"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=caption
                        on:input=move |ev| patch(serde_json::json!({"caption": event_target_value(&ev)}))
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Quote(q) => {
            let text = q.text.clone();
            let attribution = q.attribution.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Quote"</label>
                    <textarea
                        class="rounded-md border border-input bg-transparent px-2 py-1 text-sm outline-none focus:border-ring"
                        rows=3
                        prop:value=text
                        on:input=move |ev| patch(serde_json::json!({"text": event_target_value(&ev)}))
                    ></textarea>
                    <label class="text-xs text-muted-foreground">"Attribution"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=attribution
                        on:input=move |ev| patch(serde_json::json!({"attribution": event_target_value(&ev)}))
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Form(f) => {
            let submit_label = f.submit_label.clone();
            let action = f.action.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Submit label"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=submit_label
                        on:input=move |ev| patch(serde_json::json!({"submitLabel": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Action URL"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=action
                        on:input=move |ev| patch(serde_json::json!({"action": event_target_value(&ev)}))
                    />
                </div>
            }
            .into_any()
        }
        BlockData::Code(c) => {
            let code = c.code.clone();
            let language = c.language.clone();
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Language"</label>
                    <input
                        class="h-8 rounded-md border border-input bg-transparent px-2 text-sm outline-none focus:border-ring"
                        prop:value=language
                        on:input=move |ev| patch(serde_json::json!({"language": event_target_value(&ev)}))
                    />
                    <label class="text-xs text-muted-foreground">"Code"</label>
                    <textarea
                        class="rounded-md border border-input bg-transparent px-2 py-1 font-mono text-xs outline-none focus:border-ring"
                        rows=6
                        prop:value=code
                        on:input=move |ev| patch(serde_json::json!({"code": event_target_value(&ev)}))
                    ></textarea>
                </div>
            }
            .into_any()
        }
        BlockData::Toc(t) => {
            let max_level = t.max_level;
            view! {
                <div class="flex flex-col gap-1.5">
                    <label class="text-xs text-muted-foreground">"Deepest heading level"</label>
                    <div class="flex gap-1">
                        {(1u8..=4)
                            .map(|n| {
                                let variant = if max_level == n {
                                    ButtonVariant::Default
                                } else {
                                    ButtonVariant::Outline
                                };
                                view! {
                                    <Button
                                        variant=variant
                                        size=ButtonSize::Sm
                                        on:click=move |_| patch(serde_json::json!({"maxLevel": n}))
                                    >
                                        {format!("H{n}")}
                                    </Button>
                                }
                            })
                            .collect_view()}
                    </div>
                </div>
            }
            .into_any()
        }
        BlockData::Divider(_) | BlockData::Social(_) | BlockData::Accordion(_) | BlockData::Table(_) => {
            view! {
                <p class="text-xs text-muted-foreground">"No content fields for this block."</p>
            }
            .into_any()
        }
    }
}

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PageDetail;

    #[test]
    fn test_loaded_text_block_renders_sanitized_html() {
        // Wire-shaped page, as another client may have saved it.
        let json = r#"{
            "id": "pg-1",
            "title": "Landing",
            "updated-at": "t0",
            "blocks": [
                {"id": "blk-1", "type": "text",
                 "content": {"html": "<p onclick=\"steal()\">hi</p><script>alert(1)</script>"}}
            ]
        }"#;
        let page: PageDetail = serde_json::from_str(json).expect("page should parse");
        let BlockData::Text(t) = &page.blocks[0].data else {
            panic!("expected text block");
        };

        let rendered = display_html(&t.html);
        assert!(!rendered.contains("script"));
        assert!(!rendered.contains("onclick"));
        assert!(rendered.contains("hi"));
    }

    #[test]
    fn test_image_preview_rejects_script_urls() {
        assert_eq!(display_src("javascript:alert(1)"), "");
        assert_eq!(display_src("data:text/html,x"), "");
        assert_eq!(
            display_src("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }
}
