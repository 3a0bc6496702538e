use std::cell::Cell;
use std::rc::Rc;

use rollcall_core::{UsersView, ViewEvent};
use wasm_bindgen_futures::spawn_local;
use web_sys::AbortController;
use yew::prelude::*;

use crate::api;

const TITLE: &str = "Authorized Users";

/// Adattatore tra la macchina a stati condivisa e `use_reducer`.
#[derive(Default, PartialEq)]
struct ViewModel(UsersView);

impl Reducible for ViewModel {
    type Action = ViewEvent;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut view = self.0.clone();
        view.apply(action);
        Rc::new(ViewModel(view))
    }
}

/// Lista degli utenti autorizzati. Scarica i dati una volta sola, alla prima
/// visualizzazione; se la richiesta fallisce la lista resta vuota.
#[function_component(Users)]
pub fn users() -> Html {
    let view = use_reducer(ViewModel::default);

    {
        let view = view.clone();
        use_effect_with((), move |_| {
            // true finché il componente è montato
            let mounted = Rc::new(Cell::new(true));
            let controller = AbortController::new().ok();

            if view.0.should_fetch() {
                view.dispatch(ViewEvent::FetchStarted);

                let mounted = mounted.clone();
                let signal = controller.as_ref().map(|c| c.signal());
                spawn_local(async move {
                    let outcome = api::fetch_users(signal.as_ref()).await;
                    if !mounted.get() {
                        return;
                    }
                    if let Err(e) = &outcome {
                        web_sys::console::warn_1(&format!("failed to load users: {e}").into());
                    }
                    view.dispatch(ViewEvent::from_outcome(outcome));
                });
            }

            move || {
                mounted.set(false);
                if let Some(controller) = controller {
                    controller.abort();
                }
            }
        });
    }

    html! {
        <div>
            <h1>{ TITLE }</h1>
            <ul>
                { for view.0.items().into_iter().map(|item| html! {
                    <li key={item.key.to_string()}>{ item.label }</li>
                }) }
            </ul>
        </div>
    }
}
