use eframe::egui;

use crate::ui::state::FormField;

/// Draws the send form. Returns true when the user submitted it, either
/// with the button or Enter in a field.
pub fn render(ui: &mut egui::Ui, fields: &mut [FormField]) -> bool {
    let mut submit = false;
    egui::Grid::new("send_form").num_columns(2).show(ui, |ui| {
        for field in fields.iter_mut().filter(|field| !field.hidden) {
            ui.label(&field.label);
            let response = ui.text_edit_singleline(&mut field.value);
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
            ui.end_row();
        }
    });

    if ui.button("Send").clicked() {
        submit = true;
    }

    submit
}
