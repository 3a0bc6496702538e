mod api;
mod components;

use components::Users;
use yew::prelude::*;

#[function_component(App)]
fn app() -> Html {
    html! {
        <div class="app">
            <header class="app-header">
                // logo.svg arriva dagli asset pubblici serviti dal server
                <img src="/logo.svg" class="app-logo" alt="logo" />
                <Users />
            </header>
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
