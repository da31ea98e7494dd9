use crate::state::AppState;
use std::time::Duration;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Espera hasta que el job llegue a DONE y después `linger` más, para que los
/// workers que siguen preguntando alcancen a recibir Exit.
pub async fn wait_until_done(state: AppState, linger: Duration) {
    loop {
        let done = state.coordinator.lock().unwrap().is_done();
        if done {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    info!("job terminado, cerrando el master en {:?}", linger);
    tokio::time::sleep(linger).await;
}

/// Señal de apagado del server: fin del job o Ctrl-C.
pub async fn shutdown_signal(state: AppState, linger: Duration) {
    tokio::select! {
        _ = wait_until_done(state, linger) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C recibido, abortando el job");
        }
    }
}
